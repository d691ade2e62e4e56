pub mod config;
mod engine;
pub mod error;
pub mod frame;
mod gpu;
pub mod input;
mod sprite;

pub use config::{CliArgs, DemoConfig};
pub use engine::{Engine, GpuSurface, SpriteTexture, WindowEvents};
pub use error::{DemoError, ErrorKind, Result};
pub use frame::{EventSource, FrameLoop, Position, RenderSurface, Rgba, SpriteRect};
pub use gpu::WGPU;
pub use input::{FrameEvent, InputSnapshot, TerminateFlag};
pub use sprite::{GPUCamera, GPUSprite};
