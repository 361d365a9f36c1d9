use std::fmt;
use std::io::Read;
use std::sync::Arc;

use image::RgbaImage;

use super::ResourceLoader;

/// Immutable RGBA8 image handed between the scene engine and the backend.
///
/// Cloning is cheap (shared pixels). A zero-sized image is the placeholder
/// returned when loading fails; callers check [`Image::is_placeholder`] before use.
#[derive(Debug, Clone)]
pub struct Image {
    pixels: Arc<RgbaImage>,
}

impl Image {
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self { pixels: Arc::new(pixels) }
    }

    /// Solid-color image, mostly useful for tests and blank regions.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self::from_rgba(RgbaImage::from_pixel(width, height, image::Rgba(rgba)))
    }

    /// Wraps tightly packed RGBA8 bytes; the length must be exactly
    /// `width * height * 4`.
    pub fn from_raw(rgba: Vec<u8>, width: u32, height: u32) -> Result<Self, ImageLoadError> {
        let len = rgba.len();
        if len != width as usize * height as usize * 4 {
            return Err(ImageLoadError::SizeMismatch { width, height, len });
        }
        RgbaImage::from_raw(width, height, rgba)
            .map(Self::from_rgba)
            .ok_or(ImageLoadError::SizeMismatch { width, height, len })
    }

    pub fn placeholder() -> Self {
        Self::from_rgba(RgbaImage::new(0, 0))
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    #[inline]
    pub fn is_placeholder(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    #[inline]
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    #[inline]
    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }
}

/// Why an image could not be produced.
#[derive(Debug)]
pub enum ImageLoadError {
    /// The resource loader has no entry for the name.
    NotFound(String),
    /// The stream was found but could not be read.
    Io { name: String, source: std::io::Error },
    /// The bytes are not a supported image.
    Decode { name: String, source: image::ImageError },
    /// Raw RGBA data does not match the declared dimensions.
    SizeMismatch { width: u32, height: u32, len: usize },
}

impl fmt::Display for ImageLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageLoadError::NotFound(name) => write!(f, "resource not found: [{name}]"),
            ImageLoadError::Io { name, source } => write!(f, "failed to read [{name}]: {source}"),
            ImageLoadError::Decode { name, source } => {
                write!(f, "failed to decode [{name}]: {source}")
            }
            ImageLoadError::SizeMismatch { width, height, len } => write!(
                f,
                "raw image data has {len} bytes, expected {} for {width}x{height} RGBA",
                *width as usize * *height as usize * 4
            ),
        }
    }
}

impl std::error::Error for ImageLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImageLoadError::Io { source, .. } => Some(source),
            ImageLoadError::Decode { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Reads a whole resource through `loader`.
pub fn read_resource(loader: &dyn ResourceLoader, name: &str) -> Result<Vec<u8>, ImageLoadError> {
    let mut stream = loader
        .open(name)
        .ok_or_else(|| ImageLoadError::NotFound(name.to_string()))?;
    let mut bytes = Vec::new();
    stream
        .read_to_end(&mut bytes)
        .map_err(|source| ImageLoadError::Io { name: name.to_string(), source })?;
    Ok(bytes)
}

/// Decodes encoded image bytes to RGBA8.
///
/// The file extension of `name` is used as a format hint; unknown extensions
/// fall back to content sniffing.
pub fn decode_image(name: &str, bytes: &[u8]) -> Result<RgbaImage, ImageLoadError> {
    let decoded = match image::ImageFormat::from_path(name) {
        Ok(format) => image::load_from_memory_with_format(bytes, format),
        Err(_) => image::load_from_memory(bytes),
    };
    decoded
        .map(|img| img.to_rgba8())
        .map_err(|source| ImageLoadError::Decode { name: name.to_string(), source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::MemoryResourceLoader;

    fn png_bytes(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, image::Rgba(rgba));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn placeholder_is_zero_sized() {
        let img = Image::placeholder();
        assert!(img.is_placeholder());
        assert_eq!((img.width(), img.height()), (0, 0));
    }

    #[test]
    fn decode_png_by_extension() {
        let bytes = png_bytes(3, 2, [1, 2, 3, 4]);
        let img = decode_image("icon.png", &bytes).unwrap();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(2, 1).0, [1, 2, 3, 4]);
    }

    #[test]
    fn decode_garbage_fails() {
        let err = decode_image("broken.png", b"definitely not a png").unwrap_err();
        assert!(matches!(err, ImageLoadError::Decode { .. }));
    }

    #[test]
    fn read_missing_resource_is_not_found() {
        let loader = MemoryResourceLoader::new();
        let err = read_resource(&loader, "nope.png").unwrap_err();
        assert!(matches!(err, ImageLoadError::NotFound(_)));
    }
}
