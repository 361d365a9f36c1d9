//! Geometry types shared by the batch manager, textures and surfaces.
//!
//! Canonical space:
//! - backend pixels, origin top-left
//! - +X right, +Y down
//!
//! Scene engines hand in `f32` geometry; everything that touches pixels works
//! on integer [`PixelRect`]s.

mod rect;

pub use rect::{PixelRect, Rect};
