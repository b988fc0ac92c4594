use crate::animation::EaseOptions;
use crate::core::view::ViewRequest;
use crate::input::{
    events::InputEvent,
    handler::{Gesture, Handler, HandlerContext},
};

/// Double click zooms in around the pointer, shift zooms out
#[derive(Debug, Default)]
pub struct ClickZoomHandler;

impl ClickZoomHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Handler for ClickZoomHandler {
    fn name(&self) -> &'static str {
        "click_zoom"
    }

    fn handle(&mut self, event: &InputEvent, context: &HandlerContext<'_>) -> Option<Gesture> {
        let InputEvent::DoubleClick {
            position,
            modifiers,
        } = *event
        else {
            return None;
        };

        let config = context.config;
        let delta = if modifiers.shift {
            -config.click_zoom_delta
        } else {
            config.click_zoom_delta
        };

        Some(Gesture::Zoom(
            ViewRequest::new()
                .zoom(context.state.zoom() + delta)
                .around(context.state.canvas_to_map(&position)),
            EaseOptions::from_millis(config.click_zoom_duration_ms),
        ))
    }
}
