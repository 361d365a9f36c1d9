//! Resource factories and resource loading.
//!
//! Responsibilities:
//! - decouple the backend from one concrete pixel/surface stack (`ImageFactory`,
//!   `BufferFactory`)
//! - resolve filenames to byte streams (`ResourceLoader`)
//! - create mouse cursors (`MouseCursorFactory`)
//!
//! Everything a host environment would normally answer through global queries
//! is injected here at construction time.

mod cursor;
mod factory;
mod image;
mod loader;

pub use cursor::{
    CursorError, CursorHandle, ImageCursorFactory, ImageMouseCursor, MouseCursor,
    MouseCursorFactory,
};
pub use factory::{BufferFactory, ImageFactory, SoftwareBufferFactory, SoftwareImageFactory};
pub use self::image::{decode_image, read_resource, Image, ImageLoadError};
pub use loader::{FileResourceLoader, MemoryResourceLoader, ResourceLoader};
