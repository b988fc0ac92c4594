//! Input handling: raw host events are turned into gestures by a chain of
//! handlers, and the map reports what happened through [`MapEvent`]s.

pub mod click_zoom;
pub mod events;
pub mod handler;
pub mod interaction;
pub mod pan;
pub mod scroll_zoom;

pub use click_zoom::ClickZoomHandler;
pub use events::{EventManager, InputEvent, MapEvent, Modifiers, PointerButton, WheelMode};
pub use handler::{Gesture, Handler, HandlerContext, HandlerManager};
pub use interaction::InteractionHandler;
pub use pan::PanHandler;
pub use scroll_zoom::{ScrollKind, ScrollZoomHandler};
