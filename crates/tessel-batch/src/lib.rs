//! Tessel batch backend.
//!
//! This crate turns a stream of colored/textured quad requests from a scene
//! engine into a small number of draw operations on a host drawing surface.
//! It owns texture ids, atlases, the per-frame batch list and the cursor cache.
//!
//! Entry point: [`backend::BatchRenderBackend`].

pub mod backend;
pub mod batch;
pub mod coords;
pub mod logging;
pub mod paint;
pub mod pool;
pub mod resource;
pub mod surface;
pub mod texture;

pub use backend::{BackendConfig, BatchRenderBackend, Factories, FrameStats};
pub use batch::BlendMode;
pub use coords::{PixelRect, Rect};
pub use paint::{Color, QuadGradient};
pub use texture::TextureId;
