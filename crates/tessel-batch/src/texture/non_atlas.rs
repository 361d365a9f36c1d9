use std::sync::Arc;

use image::RgbaImage;

use super::{clamp_priority, sealed, Texture, TextureError, TextureId};
use crate::coords::PixelRect;
use crate::paint::Color;
use crate::resource::{Image, ImageFactory};
use crate::surface::{self, BlitParams, DrawSurface};

/// Non-atlas texture: a single image held in a stable buffer.
///
/// The buffer is allocated by the first write or clear.
pub struct ImageTexture {
    id: TextureId,
    width: u32,
    height: u32,
    priority: f32,
    factory: Arc<dyn ImageFactory>,
    pixels: Option<RgbaImage>,
    disposed: bool,
}

impl ImageTexture {
    pub fn new(id: TextureId, width: u32, height: u32, factory: Arc<dyn ImageFactory>) -> Self {
        Self { id, width, height, priority: 0.5, factory, pixels: None, disposed: false }
    }

    /// Texture sized to `image` and holding a copy of it.
    pub fn from_image(id: TextureId, image: &Image, factory: Arc<dyn ImageFactory>) -> Self {
        let mut texture = Self::new(id, image.width(), image.height(), factory);
        texture.write_image_to_texture(image, 0, 0);
        texture
    }

    pub fn pixels(&self) -> Option<&RgbaImage> {
        self.pixels.as_ref()
    }

    fn pixels_or_allocate(&mut self) -> &mut RgbaImage {
        let (id, width, height) = (self.id, self.width, self.height);
        let resurrect = std::mem::take(&mut self.disposed);
        let factory = &self.factory;
        self.pixels.get_or_insert_with(|| {
            if resurrect {
                log::debug!("re-allocating disposed texture {id}");
            }
            factory.create_buffered_image(width, height)
        })
    }
}

impl sealed::Sealed for ImageTexture {}

impl Texture for ImageTexture {
    fn id(&self) -> TextureId {
        self.id
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn write_image_to_texture(&mut self, image: &Image, x: i32, y: i32) {
        let target = self.pixels_or_allocate();
        surface::write_region(target, image.pixels(), x, y);
    }

    fn draw_texture(
        &mut self,
        target: &mut dyn DrawSurface,
        dest: PixelRect,
        src: PixelRect,
        params: &BlitParams,
    ) -> Result<(), TextureError> {
        if self.disposed {
            return Err(TextureError::Disposed);
        }
        // Never written: nothing to draw yet.
        if let Some(pixels) = self.pixels.as_ref() {
            target.blit(pixels, src, dest, params);
        }
        Ok(())
    }

    fn set_acceleration_priority(&mut self, priority: f32) {
        self.priority = clamp_priority(priority);
    }

    fn acceleration_priority(&self) -> f32 {
        self.priority
    }

    fn clear(&mut self, color: Color) {
        let rgba = color.to_rgba8();
        surface::fill_solid(self.pixels_or_allocate(), rgba);
    }

    fn dispose(&mut self) {
        self.pixels = None;
        self.disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}
