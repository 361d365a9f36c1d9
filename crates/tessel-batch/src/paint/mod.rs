//! Color model shared between the façade, batches and surfaces.
//!
//! Scope:
//! - straight-alpha RGBA colors
//! - four-corner quad gradients (bilinear interpolation)

pub mod color;
pub mod gradient;

pub use color::Color;
pub use gradient::QuadGradient;
