use std::sync::Arc;

use crate::batch::DEFAULT_BATCH_CAPACITY;
use crate::paint::Color;
use crate::resource::{
    BufferFactory, ImageCursorFactory, ImageFactory, MouseCursorFactory, SoftwareBufferFactory,
    SoftwareImageFactory,
};

/// Backend tuning knobs.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Maximum quads per batch.
    pub batch_capacity: usize,
    /// Color `clear_texture_atlas` resets atlases to.
    pub atlas_clear_color: Color,
    /// Acceleration priority given to new non-atlas textures.
    pub non_atlas_priority: f32,
    /// Acceleration priority given to new atlases.
    pub atlas_priority: f32,
    /// Bilinear instead of nearest-neighbor sampling.
    pub high_quality_textures: bool,
    /// Whether `remove_image_from_atlas` blanks the region.
    pub fill_removed_images: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            batch_capacity: DEFAULT_BATCH_CAPACITY,
            atlas_clear_color: Color::WHITE,
            non_atlas_priority: 0.5,
            atlas_priority: 1.0,
            high_quality_textures: false,
            fill_removed_images: false,
        }
    }
}

/// Capability set injected at construction.
pub struct Factories {
    pub image: Arc<dyn ImageFactory>,
    pub buffer: Arc<dyn BufferFactory>,
    pub cursor: Box<dyn MouseCursorFactory>,
}

impl Factories {
    /// Pure CPU factories; surfaces are never lost.
    pub fn software() -> Self {
        Self {
            image: Arc::new(SoftwareImageFactory),
            buffer: Arc::new(SoftwareBufferFactory),
            cursor: Box::new(ImageCursorFactory),
        }
    }

    pub fn with_image_factory(mut self, image: Arc<dyn ImageFactory>) -> Self {
        self.image = image;
        self
    }

    pub fn with_cursor_factory(mut self, cursor: Box<dyn MouseCursorFactory>) -> Self {
        self.cursor = cursor;
        self
    }
}

impl Default for Factories {
    fn default() -> Self {
        Self::software()
    }
}
