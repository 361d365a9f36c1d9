use std::fmt;

use super::{decode_image, read_resource, Image, ImageLoadError, ResourceLoader};

/// Opaque handle the scene engine holds for a created cursor.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct CursorHandle(u32);

impl CursorHandle {
    pub(crate) const fn new(raw: u32) -> Self {
        Self(raw)
    }
}

/// A host mouse cursor.
pub trait MouseCursor: Send {
    fn hotspot(&self) -> (i32, i32);

    fn enable(&mut self);
    fn disable(&mut self);
    fn is_enabled(&self) -> bool;

    /// Releases native resources. Calling it again is a no-op.
    fn dispose(&mut self);

    /// Cursor pixels, for hosts that draw the cursor themselves.
    fn image(&self) -> Option<&Image> {
        None
    }
}

#[derive(Debug)]
pub enum CursorError {
    NotFound(String),
    Decode(ImageLoadError),
    /// The host rejected the cursor image.
    Platform(String),
}

impl fmt::Display for CursorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CursorError::NotFound(name) => write!(f, "cursor image not found: {name}"),
            CursorError::Decode(err) => write!(f, "cursor image could not be decoded: {err}"),
            CursorError::Platform(msg) => write!(f, "cursor rejected by host: {msg}"),
        }
    }
}

impl std::error::Error for CursorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CursorError::Decode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ImageLoadError> for CursorError {
    fn from(err: ImageLoadError) -> Self {
        match err {
            ImageLoadError::NotFound(name) => CursorError::NotFound(name),
            other => CursorError::Decode(other),
        }
    }
}

/// Creates cursors from image resources.
pub trait MouseCursorFactory: Send + Sync {
    fn create(
        &self,
        filename: &str,
        hotspot_x: i32,
        hotspot_y: i32,
        loader: &dyn ResourceLoader,
    ) -> Result<Box<dyn MouseCursor>, CursorError>;
}

/// Loads a cursor image through `loader`.
pub(crate) fn load_cursor_image(
    filename: &str,
    loader: &dyn ResourceLoader,
) -> Result<Image, CursorError> {
    let bytes = read_resource(loader, filename)?;
    let pixels = decode_image(filename, &bytes)?;
    Ok(Image::from_rgba(pixels))
}

/// Cursor that only tracks state; the host reads it back through
/// [`BatchRenderBackend::active_cursor`](crate::backend::BatchRenderBackend::active_cursor).
#[derive(Debug, Clone)]
pub struct ImageMouseCursor {
    image: Option<Image>,
    hotspot: (i32, i32),
    enabled: bool,
}

impl ImageMouseCursor {
    pub fn new(image: Image, hotspot_x: i32, hotspot_y: i32) -> Self {
        Self { image: Some(image), hotspot: (hotspot_x, hotspot_y), enabled: false }
    }

    pub fn is_disposed(&self) -> bool {
        self.image.is_none()
    }
}

impl MouseCursor for ImageMouseCursor {
    fn hotspot(&self) -> (i32, i32) {
        self.hotspot
    }

    fn enable(&mut self) {
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.enabled = false;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn dispose(&mut self) {
        self.enabled = false;
        self.image = None;
    }

    fn image(&self) -> Option<&Image> {
        self.image.as_ref()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCursorFactory;

impl MouseCursorFactory for ImageCursorFactory {
    fn create(
        &self,
        filename: &str,
        hotspot_x: i32,
        hotspot_y: i32,
        loader: &dyn ResourceLoader,
    ) -> Result<Box<dyn MouseCursor>, CursorError> {
        let image = load_cursor_image(filename, loader)?;
        Ok(Box::new(ImageMouseCursor::new(image, hotspot_x, hotspot_y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::MemoryResourceLoader;

    fn png(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([0, 0, 0, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn factory_builds_cursor_with_hotspot() {
        let loader = MemoryResourceLoader::new().with("arrow.png", png(16, 16));
        let mut cursor = ImageCursorFactory.create("arrow.png", 3, 4, &loader).unwrap();
        assert_eq!(cursor.hotspot(), (3, 4));
        assert!(!cursor.is_enabled());
        cursor.enable();
        assert!(cursor.is_enabled());
        assert_eq!(cursor.image().unwrap().width(), 16);
    }

    #[test]
    fn missing_file_is_not_found() {
        let loader = MemoryResourceLoader::new();
        let err = ImageCursorFactory.create("nope.png", 0, 0, &loader).err().unwrap();
        assert!(matches!(err, CursorError::NotFound(_)));
    }

    #[test]
    fn garbage_is_decode_error() {
        let loader = MemoryResourceLoader::new().with("bad.png", vec![1u8, 2, 3]);
        let err = ImageCursorFactory.create("bad.png", 0, 0, &loader).err().unwrap();
        assert!(matches!(err, CursorError::Decode(_)));
    }

    #[test]
    fn dispose_twice_is_harmless() {
        let mut cursor = ImageMouseCursor::new(Image::filled(1, 1, [0; 4]), 0, 0);
        cursor.enable();
        cursor.dispose();
        cursor.dispose();
        assert!(cursor.is_disposed());
        assert!(!cursor.is_enabled());
    }
}
