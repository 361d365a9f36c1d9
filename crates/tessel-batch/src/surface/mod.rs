//! Host drawing-surface capability.
//!
//! The backend needs exactly five things from a host:
//! - acquire a drawable frame target
//! - blit a rectangular image region (src rect → dest rect)
//! - fill a rectangle with a flat or interpolated color
//! - present the completed frame
//! - report the current width/height
//!
//! [`DrawSurface`] is that capability. [`SoftwareSurface`] implements it over
//! CPU buffers; other hosts (e.g. a GPU swapchain) implement it on their stack.
//!
//! Atlas textures additionally sit on [`VolatileSurface`]s, which the host may
//! invalidate at any time.

mod raster;
mod software;
mod volatile;

use std::fmt;

use image::RgbaImage;

use crate::batch::BlendMode;
use crate::coords::PixelRect;
use crate::paint::{Color, QuadGradient};

pub use raster::{blend_pixel, modulate};
pub use software::SoftwareSurface;
pub use volatile::{MemorySurface, SurfaceStatus, VolatileSurface};

pub(crate) use raster::{blit, fill, fill_solid, write_region};

/// Texture sampling used when a blit scales.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum Filter {
    #[default]
    Nearest,
    Bilinear,
}

/// How pixels are stored in a surface.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum AlphaMode {
    /// RGB is independent of alpha.
    #[default]
    Straight,
    /// RGB is multiplied by alpha; incoming straight colors are converted on write.
    Premultiplied,
}

/// Back-buffer contents right after a present.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum FlipContents {
    /// The new back buffer starts as a copy of the frame just presented.
    #[default]
    Prior,
    /// The new back buffer is cleared to the background color.
    Background,
}

/// Host-surface configuration.
///
/// Buffering depth and pixel convention are environment-specific; the backend
/// never hardcodes them.
#[derive(Debug, Clone)]
pub struct SurfaceConfig {
    /// Number of frame buffers (2 = double buffering, 3 = triple buffering).
    pub buffer_count: usize,
    pub flip_contents: FlipContents,
    pub alpha_mode: AlphaMode,
    /// Color used by `clear()`.
    pub background: Color,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            buffer_count: 2,
            flip_contents: FlipContents::Prior,
            alpha_mode: AlphaMode::Straight,
            background: Color::TRANSPARENT,
        }
    }
}

/// Per-blit parameters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BlitParams {
    pub filter: Filter,
    pub blend: BlendMode,
    /// Per-corner color multiplied into every texel. White is the identity.
    pub tint: QuadGradient,
}

impl Default for BlitParams {
    fn default() -> Self {
        Self {
            filter: Filter::Nearest,
            blend: BlendMode::Blend,
            tint: QuadGradient::uniform(Color::WHITE),
        }
    }
}

/// Failure to acquire or present a frame.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SurfaceError {
    /// The surface must be recreated.
    Lost,
    /// The surface configuration no longer matches the host (e.g. resize).
    Outdated,
    /// Acquisition timed out; skip the frame.
    Timeout,
    OutOfMemory,
    Other(String),
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceError::Lost => f.write_str("surface lost"),
            SurfaceError::Outdated => f.write_str("surface outdated"),
            SurfaceError::Timeout => f.write_str("surface acquisition timed out"),
            SurfaceError::OutOfMemory => f.write_str("out of memory"),
            SurfaceError::Other(msg) => write!(f, "surface error: {msg}"),
        }
    }
}

impl std::error::Error for SurfaceError {}

/// Outbound capability the backend draws into.
///
/// Draw operations apply to the frame acquired by the last successful
/// [`acquire_frame`](DrawSurface::acquire_frame). Implementations clip to their
/// bounds and never panic on out-of-range rectangles.
pub trait DrawSurface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Prepares the back buffer for drawing.
    fn acquire_frame(&mut self) -> Result<(), SurfaceError>;

    /// Fills `dest` with `paint`, interpolating corner colors across the rect.
    fn fill_rect(&mut self, dest: PixelRect, paint: &QuadGradient, blend: BlendMode);

    /// Draws the `src` region of `image` scaled into `dest`.
    fn blit(&mut self, image: &RgbaImage, src: PixelRect, dest: PixelRect, params: &BlitParams);

    /// Blanks the whole back buffer with the background color.
    fn clear(&mut self);

    /// Shows the completed frame.
    fn present(&mut self) -> Result<(), SurfaceError>;
}
