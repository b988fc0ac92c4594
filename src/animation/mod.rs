pub mod easing;
pub mod inertia;
pub mod transition;

pub use easing::Easing;
pub use inertia::Inertia;
pub use transition::{EaseOptions, ViewTransition};
