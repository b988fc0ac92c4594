use crate::core::geo::PixelPoint;
use crate::input::{
    events::InputEvent,
    handler::{Gesture, Handler, HandlerContext},
};

/// Reports hovers and clicks for hit-testing. Runs after the gesture
/// handlers, so it only sees input they ignored.
#[derive(Debug, Default)]
pub struct InteractionHandler {
    pressed_at: Option<PixelPoint>,
}

impl InteractionHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Handler for InteractionHandler {
    fn name(&self) -> &'static str {
        "interaction"
    }

    fn handle(&mut self, event: &InputEvent, context: &HandlerContext<'_>) -> Option<Gesture> {
        match *event {
            InputEvent::PointerMove { position, .. } => Some(Gesture::Hover(position)),
            InputEvent::PointerDown { position, .. } => {
                self.pressed_at = Some(position);
                None
            }
            InputEvent::PointerUp { position, .. } => {
                let origin = self.pressed_at.take()?;
                let threshold = context.config.drag_threshold;
                (position.subtract(&origin).length_squared() < threshold * threshold)
                    .then_some(Gesture::Click(position))
            }
            _ => None,
        }
    }
}
