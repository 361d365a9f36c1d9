//! Texture objects.
//!
//! Two kinds share one contract ([`Texture`]):
//! - [`ImageTexture`]: one logical image per texture
//! - [`AtlasTexture`]: a shared surface the caller packs sub-images into,
//!   backed by a volatile surface plus a background-maintained snapshot
//!
//! The contract is sealed; these are the only two implementations.

mod atlas;
mod non_atlas;
mod snapshot;
mod store;

use std::fmt;

use crate::coords::PixelRect;
use crate::paint::Color;
use crate::resource::Image;
use crate::surface::{BlitParams, DrawSurface};

pub use atlas::{AtlasStats, AtlasTexture, MAX_VALIDATE_ATTEMPTS};
pub use non_atlas::ImageTexture;
pub use snapshot::{SnapshotQueue, SnapshotSlot, SnapshotWorker};
pub use store::{TextureKind, TextureStore};

/// Texture identity handed to the scene engine.
///
/// Ids are positive; zero or negative means "no texture bound".
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub i32);

impl TextureId {
    pub const NONE: TextureId = TextureId(0);

    #[inline]
    pub fn is_bound(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out monotonically increasing texture ids, starting at 1.
///
/// Ids are never reused; once `i32::MAX` has been handed out the allocator is
/// exhausted and returns `None`.
#[derive(Debug)]
pub struct IdAllocator {
    next: Option<i32>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub(crate) fn starting_at(first: i32) -> Self {
        Self { next: Some(first) }
    }

    pub fn allocate(&mut self) -> Option<TextureId> {
        let id = self.next?;
        self.next = id.checked_add(1);
        Some(TextureId(id))
    }

    /// Id the next `allocate` will return.
    pub fn peek(&self) -> Option<TextureId> {
        self.next.map(TextureId)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Why a texture could not be drawn.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TextureError {
    /// Disposed and not written since.
    Disposed,
    /// The backing surface stayed invalid through validation.
    SurfaceUnavailable,
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureError::Disposed => f.write_str("texture is disposed"),
            TextureError::SurfaceUnavailable => f.write_str("texture surface is unavailable"),
        }
    }
}

impl std::error::Error for TextureError {}

mod sealed {
    pub trait Sealed {}
}

/// Shared texture contract.
pub trait Texture: sealed::Sealed + Send {
    fn id(&self) -> TextureId;
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Copies `image` into the texture with its top-left corner at `(x, y)`,
    /// overwriting. Re-allocates backing storage if the texture was disposed.
    fn write_image_to_texture(&mut self, image: &Image, x: i32, y: i32);

    /// Draws the `src` texel region into `dest` on `target`.
    fn draw_texture(
        &mut self,
        target: &mut dyn DrawSurface,
        dest: PixelRect,
        src: PixelRect,
        params: &BlitParams,
    ) -> Result<(), TextureError>;

    /// Clamped to `[0, 1]`.
    fn set_acceleration_priority(&mut self, priority: f32);
    fn acceleration_priority(&self) -> f32;

    /// Fills the whole texture with `color`. Re-allocates if disposed.
    fn clear(&mut self, color: Color);

    /// Releases backing storage. Idempotent.
    fn dispose(&mut self);
    fn is_disposed(&self) -> bool;
}

pub(crate) fn clamp_priority(priority: f32) -> f32 {
    if priority.is_nan() { 0.0 } else { priority.clamp(0.0, 1.0) }
}
