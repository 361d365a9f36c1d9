//! Per-frame quad batching.
//!
//! Quads are grouped into [`Batch`]es sharing one texture and one blend mode.
//! The [`BatchManager`] owns the ordered batch list for the current frame and
//! recycles batch records through an [`ObjectPool`](crate::pool::ObjectPool).

mod record;
mod manager;

pub use record::{Batch, Quad, DEFAULT_BATCH_CAPACITY};
pub use manager::{BatchManager, FrameStats};

/// Compositing rule applied to every quad of a batch.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum BlendMode {
    /// Source-over alpha blending.
    #[default]
    Blend,
    /// Per-channel product with the destination.
    Multiply,
    /// Source overwrites the destination.
    Opaque,
}
