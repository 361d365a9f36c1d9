use image::RgbaImage;

use super::Image;
use crate::surface::{MemorySurface, VolatileSurface};

/// Creates images and pixel surfaces for one concrete pixel stack.
///
/// Injected into the backend so it never queries host capabilities itself.
pub trait ImageFactory: Send + Sync {
    /// Wraps tightly packed RGBA8 bytes. A buffer whose length does not match
    /// `width * height * 4` yields the placeholder image.
    fn create(&self, rgba: Vec<u8>, width: u32, height: u32) -> Image;

    /// Raw RGBA8 bytes of `image`, row-major, no padding.
    fn as_bytes<'a>(&self, image: &'a Image) -> &'a [u8] {
        image.as_raw()
    }

    /// Acceleratable surface whose contents the host may discard.
    fn create_volatile_surface(&self, width: u32, height: u32) -> Box<dyn VolatileSurface>;

    /// Stable, fully transparent pixel buffer.
    fn create_buffered_image(&self, width: u32, height: u32) -> RgbaImage {
        RgbaImage::new(width, height)
    }
}

/// CPU-only factory. Its volatile surfaces never lose their contents.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareImageFactory;

impl ImageFactory for SoftwareImageFactory {
    fn create(&self, rgba: Vec<u8>, width: u32, height: u32) -> Image {
        Image::from_raw(rgba, width, height).unwrap_or_else(|err| {
            log::warn!("{err}; using placeholder");
            Image::placeholder()
        })
    }

    fn create_volatile_surface(&self, width: u32, height: u32) -> Box<dyn VolatileSurface> {
        Box::new(MemorySurface::new(width, height))
    }
}

/// Zero-filled numeric buffers in native order.
pub trait BufferFactory: Send + Sync {
    fn create_byte_buffer(&self, len: usize) -> Vec<u8>;
    fn create_float_buffer(&self, len: usize) -> Vec<f32>;
    fn create_int_buffer(&self, len: usize) -> Vec<u32>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareBufferFactory;

impl BufferFactory for SoftwareBufferFactory {
    fn create_byte_buffer(&self, len: usize) -> Vec<u8> {
        vec![0; len]
    }

    fn create_float_buffer(&self, len: usize) -> Vec<f32> {
        vec![0.0; len]
    }

    fn create_int_buffer(&self, len: usize) -> Vec<u32> {
        vec![0; len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SurfaceStatus;

    #[test]
    fn create_wraps_matching_buffer() {
        let img = SoftwareImageFactory.create(vec![9; 2 * 3 * 4], 2, 3);
        assert_eq!((img.width(), img.height()), (2, 3));
        assert_eq!(SoftwareImageFactory.as_bytes(&img), &[9u8; 24][..]);
    }

    #[test]
    fn create_with_wrong_length_is_placeholder() {
        assert!(SoftwareImageFactory.create(vec![0; 5], 2, 2).is_placeholder());
        assert!(SoftwareImageFactory.create(vec![0; 20], 2, 2).is_placeholder());
    }

    #[test]
    fn software_volatile_surface_is_valid() {
        let mut surface = SoftwareImageFactory.create_volatile_surface(4, 4);
        assert_eq!(surface.validate(), SurfaceStatus::Valid);
        assert_eq!(surface.pixels().dimensions(), (4, 4));
    }

    #[test]
    fn buffers_are_zero_filled() {
        let f = SoftwareBufferFactory;
        assert!(f.create_byte_buffer(8).iter().all(|&b| b == 0));
        assert_eq!(f.create_float_buffer(3), vec![0.0; 3]);
        assert_eq!(f.create_int_buffer(2).len(), 2);
    }
}
