pub mod context;
pub mod scheduler;
pub mod surface;

// Re-export main types
pub use context::{MapState, PreloadContext, RenderContext};
pub use scheduler::{FrameHandle, ManualHost, RenderHost, RenderPriority, RenderQueue, TimerHandle};
pub use surface::{Color, DrawCommand, RecordingSurface, Surface};
