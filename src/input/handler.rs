use crate::animation::EaseOptions;
use crate::core::{config::GestureConfig, geo::PixelPoint, view::ViewRequest};
use crate::input::{
    click_zoom::ClickZoomHandler, events::InputEvent, interaction::InteractionHandler,
    pan::PanHandler, scroll_zoom::ScrollZoomHandler,
};
use crate::rendering::context::MapState;
use instant::Instant;

/// What a handler asks the map to do
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    /// Jump to the view and record it for inertia
    Pan(ViewRequest),
    /// Jump to the view, then release with inertia
    PanEnd(ViewRequest),
    /// Ease to the view
    Zoom(ViewRequest, EaseOptions),
    /// Pointer released without dragging
    Click(PixelPoint),
    /// Pointer moved without dragging
    Hover(PixelPoint),
}

/// Read-only view of the map handed to handlers
pub struct HandlerContext<'a> {
    pub state: &'a MapState,
    pub now: Instant,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub config: &'a GestureConfig,
}

/// Turns raw input into gestures
pub trait Handler: Send {
    fn name(&self) -> &'static str;

    fn handle(&mut self, event: &InputEvent, context: &HandlerContext<'_>) -> Option<Gesture>;

    /// Called every frame while `needs_poll` is true, for input buffered across time
    fn poll(&mut self, _context: &HandlerContext<'_>) -> Option<Gesture> {
        None
    }

    fn needs_poll(&self) -> bool {
        false
    }
}

/// Runs handlers in order; the first one to respond wins
#[derive(Default)]
pub struct HandlerManager {
    handlers: Vec<Box<dyn Handler>>,
}

impl HandlerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scroll-zoom, pan, click-zoom and interaction, as enabled by `config`
    pub fn with_defaults(config: &GestureConfig) -> Self {
        let mut manager = Self::new();
        if config.scroll_zoom {
            manager.add_handler(Box::new(ScrollZoomHandler::new()));
        }
        if config.pan {
            manager.add_handler(Box::new(PanHandler::new()));
        }
        if config.click_zoom {
            manager.add_handler(Box::new(ClickZoomHandler::new()));
        }
        if config.interaction {
            manager.add_handler(Box::new(InteractionHandler::new()));
        }
        manager
    }

    pub fn add_handler(&mut self, handler: Box<dyn Handler>) {
        self.handlers.push(handler);
    }

    pub fn remove_handler(&mut self, name: &str) -> Option<Box<dyn Handler>> {
        let index = self.handlers.iter().position(|h| h.name() == name)?;
        Some(self.handlers.remove(index))
    }

    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub fn handle(&mut self, event: &InputEvent, context: &HandlerContext<'_>) -> Option<Gesture> {
        self.handlers
            .iter_mut()
            .find_map(|handler| handler.handle(event, context))
    }

    pub fn poll(&mut self, context: &HandlerContext<'_>) -> Option<Gesture> {
        self.handlers
            .iter_mut()
            .filter(|handler| handler.needs_poll())
            .find_map(|handler| handler.poll(context))
    }

    pub fn needs_poll(&self) -> bool {
        self.handlers.iter().any(|h| h.needs_poll())
    }
}
