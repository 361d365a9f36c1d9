use super::BlendMode;
use crate::coords::PixelRect;
use crate::paint::QuadGradient;
use crate::texture::TextureId;

pub const DEFAULT_BATCH_CAPACITY: usize = 512;

/// One quad in backend pixel space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Quad {
    pub dest: PixelRect,
    /// Corner colors: top-left, bottom-left, bottom-right, top-right.
    pub colors: QuadGradient,
    /// Source region in absolute texels. Ignored when no texture is bound.
    pub src: PixelRect,
}

impl Quad {
    pub fn new(dest: PixelRect, colors: QuadGradient, src: PixelRect) -> Self {
        Self { dest, colors, src }
    }
}

/// Bounded run of quads sharing a texture and blend mode.
#[derive(Debug)]
pub struct Batch {
    quads: Vec<Quad>,
    capacity: usize,
    blend_mode: BlendMode,
    texture_id: TextureId,
}

impl Batch {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            quads: Vec::with_capacity(capacity),
            capacity,
            blend_mode: BlendMode::Blend,
            texture_id: TextureId::NONE,
        }
    }

    /// Resets a (possibly recycled) batch for new use.
    pub fn begin(&mut self, blend_mode: BlendMode, texture_id: TextureId) {
        self.quads.clear();
        self.blend_mode = blend_mode;
        self.texture_id = texture_id;
    }

    #[inline]
    pub fn can_add_quad(&self) -> bool {
        self.quads.len() < self.capacity
    }

    /// Appends `quad`. Returns `false` if the batch is full.
    pub fn add_quad(&mut self, quad: Quad) -> bool {
        if !self.can_add_quad() {
            return false;
        }
        self.quads.push(quad);
        true
    }

    pub fn quads(&self) -> &[Quad] {
        &self.quads
    }

    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    pub fn texture_id(&self) -> TextureId {
        self.texture_id
    }
}
