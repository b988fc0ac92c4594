use crate::core::{geo::PixelPoint, view::ViewRequest};
use crate::input::{
    events::{InputEvent, PointerButton},
    handler::{Gesture, Handler, HandlerContext},
};

#[derive(Debug, Clone, Copy)]
struct Press {
    origin: PixelPoint,
    last: PixelPoint,
    dragging: bool,
}

/// Drag to move the map
#[derive(Debug, Default)]
pub struct PanHandler {
    press: Option<Press>,
}

impl PanHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.press.map_or(false, |p| p.dragging)
    }
}

impl Handler for PanHandler {
    fn name(&self) -> &'static str {
        "pan"
    }

    fn handle(&mut self, event: &InputEvent, context: &HandlerContext<'_>) -> Option<Gesture> {
        match *event {
            InputEvent::PointerDown {
                position,
                button: PointerButton::Primary,
                ..
            } => {
                self.press = Some(Press {
                    origin: position,
                    last: position,
                    dragging: false,
                });
                None
            }
            InputEvent::PointerMove { position, .. } => {
                let press = self.press.as_mut()?;

                if !press.dragging {
                    let threshold = context.config.drag_threshold;
                    if position.subtract(&press.origin).length_squared() < threshold * threshold {
                        return None;
                    }
                    press.dragging = true;
                }

                // pointer moves right, map center moves left
                let delta = context.state.unproject(&press.last.subtract(&position));
                press.last = position;

                Some(Gesture::Pan(
                    ViewRequest::new()
                        .center(context.state.view.center.add(&delta))
                        .align_to_pixels(false),
                ))
            }
            InputEvent::PointerUp { position, .. } => {
                let press = self.press.take()?;
                if press.dragging {
                    Some(Gesture::PanEnd(ViewRequest::new().align_to_pixels(true)))
                } else {
                    Some(Gesture::Click(position))
                }
            }
            _ => None,
        }
    }
}
