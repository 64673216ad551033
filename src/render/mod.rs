//! Map view: projection state, drawing primitives and frame pacing

pub mod viewport;
pub mod surface;
pub mod renderer;
pub mod scheduler;

pub use viewport::{Viewport, ViewportConfig};
pub use surface::{Color, CommandRecorder, DrawCommand, DrawSurface, TextAlign};
pub use renderer::Renderer;
pub use scheduler::FrameScheduler;
