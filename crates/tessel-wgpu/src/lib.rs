//! wgpu + winit host for the tessel batch backend.
//!
//! - [`Gpu`]: device, queue and window surface
//! - [`GpuSurface`]: a `DrawSurface` that composes on the CPU and presents the
//!   finished frame as one full-screen textured quad
//! - [`WinitCursorFactory`]: custom window cursors

mod cursor;
mod gpu;
mod presenter;
mod surface;

pub use cursor::{CursorRequest, CursorRequests, WinitCursorFactory, WinitMouseCursor};
pub use gpu::{Gpu, GpuFrame, GpuInit, SurfaceErrorAction};
pub use presenter::Presenter;
pub use surface::GpuSurface;
