use super::{Batch, BlendMode, Quad};
use crate::pool::{ObjectPool, PoolStats};
use crate::surface::{BlitParams, DrawSurface, Filter};
use crate::texture::{Texture, TextureId, TextureStore};

/// What the last `render` drew.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub batches: usize,
    pub quads: usize,
    /// Quads drawn as flat color because their texture was missing or unusable.
    pub fallback_quads: usize,
}

/// Ordered batch list for one frame.
///
/// Draw order is call order: quads render in insertion order within a batch,
/// batches in creation order. Nothing is sorted or merged.
#[derive(Debug)]
pub struct BatchManager {
    pool: ObjectPool<Batch>,
    batches: Vec<Batch>,
    /// Whether the last batch in `batches` still accepts quads.
    accumulating: bool,
}

impl BatchManager {
    pub fn new(capacity: usize) -> Self {
        Self {
            pool: ObjectPool::new(move || Batch::new(capacity)),
            batches: Vec::new(),
            accumulating: false,
        }
    }

    /// Recycles every batch of the previous frame.
    pub fn begin_frame(&mut self) {
        for batch in self.batches.drain(..) {
            self.pool.free(batch);
        }
        self.accumulating = false;
    }

    /// Starts a new batch and makes it current.
    pub fn begin_batch(&mut self, blend_mode: BlendMode, texture_id: TextureId) {
        let mut batch = self.pool.allocate();
        batch.begin(blend_mode, texture_id);
        log::trace!("begin batch #{} ({blend_mode:?}, texture {texture_id})", self.batches.len());
        self.batches.push(batch);
        self.accumulating = true;
    }

    /// Appends a quad, starting a new batch when the current one is full or
    /// bound to a different texture. Empty quads are dropped.
    pub fn add_quad(&mut self, quad: Quad, texture_id: TextureId) -> bool {
        if quad.dest.is_empty() {
            return false;
        }

        let blend_mode = match self.current() {
            Some(batch) if batch.can_add_quad() && batch.texture_id() == texture_id => None,
            Some(batch) => Some(batch.blend_mode()),
            None => Some(BlendMode::default()),
        };
        if let Some(blend_mode) = blend_mode {
            self.begin_batch(blend_mode, texture_id);
        }

        match self.batches.last_mut() {
            Some(batch) => batch.add_quad(quad),
            None => false,
        }
    }

    fn current(&self) -> Option<&Batch> {
        if self.accumulating { self.batches.last() } else { None }
    }

    /// Draws every batch onto `target`, in order.
    ///
    /// A missing or unusable texture degrades its quads to the flat color
    /// gradient; the frame always completes.
    pub fn render(
        &mut self,
        textures: &mut TextureStore,
        target: &mut dyn DrawSurface,
        filter: Filter,
    ) -> FrameStats {
        let mut stats = FrameStats::default();

        for batch in &self.batches {
            stats.batches += 1;
            stats.quads += batch.len();

            let id = batch.texture_id();
            let mut texture = if id.is_bound() { textures.get_mut(id) } else { None };
            if id.is_bound() && texture.is_none() {
                log::warn!("texture {id} not found; drawing {} quads as flat color", batch.len());
            }

            let mut reported = false;
            for quad in batch.quads() {
                if let Some(tex) = texture.as_deref_mut() {
                    let params =
                        BlitParams { filter, blend: batch.blend_mode(), tint: quad.colors };
                    match tex.draw_texture(target, quad.dest, quad.src, &params) {
                        Ok(()) => continue,
                        Err(err) if !reported => {
                            log::warn!("texture {id}: {err}; drawing flat color");
                            reported = true;
                        }
                        Err(_) => {}
                    }
                }
                if id.is_bound() {
                    stats.fallback_quads += 1;
                }
                target.fill_rect(quad.dest, &quad.colors, batch.blend_mode());
            }
        }

        // Quads added after a render start a fresh batch.
        self.accumulating = false;
        stats
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::PixelRect;
    use crate::paint::{Color, QuadGradient};
    use crate::surface::{SoftwareSurface, SurfaceConfig};

    fn quad_at(x: i32) -> Quad {
        Quad::new(PixelRect::new(x, 0, 1, 1), Color::WHITE.into(), PixelRect::new(0, 0, 1, 1))
    }

    #[test]
    fn splits_exactly_at_capacity() {
        let mut m = BatchManager::new(3);
        for i in 0..7 {
            assert!(m.add_quad(quad_at(i), TextureId(1)));
        }
        let sizes: Vec<_> = m.batches().iter().map(Batch::len).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
    }

    #[test]
    fn splits_on_texture_change_and_keeps_blend() {
        let mut m = BatchManager::new(8);
        m.begin_batch(BlendMode::Multiply, TextureId(1));
        m.add_quad(quad_at(0), TextureId(1));
        m.add_quad(quad_at(1), TextureId(2));
        m.add_quad(quad_at(2), TextureId(2));

        assert_eq!(m.len(), 2);
        assert_eq!(m.batches()[1].texture_id(), TextureId(2));
        assert_eq!(m.batches()[1].blend_mode(), BlendMode::Multiply);
    }

    #[test]
    fn explicit_begin_batch_splits_on_blend_change() {
        let mut m = BatchManager::new(8);
        m.add_quad(quad_at(0), TextureId::NONE);
        m.begin_batch(BlendMode::Opaque, TextureId::NONE);
        m.add_quad(quad_at(1), TextureId::NONE);
        assert_eq!(m.len(), 2);
        assert_eq!(m.batches()[0].blend_mode(), BlendMode::Blend);
        assert_eq!(m.batches()[1].len(), 1);
    }

    #[test]
    fn empty_quad_is_dropped() {
        let mut m = BatchManager::new(8);
        m.add_quad(quad_at(0), TextureId::NONE);
        let empty =
            Quad::new(PixelRect::new(0, 0, 0, 5), Color::WHITE.into(), PixelRect::default());
        assert!(!m.add_quad(empty, TextureId::NONE));
        assert_eq!(m.batches()[0].len(), 1);
    }

    #[test]
    fn begin_frame_recycles_batches() {
        let mut m = BatchManager::new(2);
        for i in 0..4 {
            m.add_quad(quad_at(i), TextureId::NONE);
        }
        m.begin_frame();
        assert!(m.is_empty());

        for i in 0..4 {
            m.add_quad(quad_at(i), TextureId::NONE);
        }
        let st = m.pool_stats();
        assert_eq!(st.created, 2);
        assert_eq!(st.reused, 2);
    }

    #[test]
    fn render_draws_in_call_order_with_fallback() {
        let mut m = BatchManager::new(8);
        let mut store = TextureStore::new();
        let mut target = SoftwareSurface::new(2, 1, SurfaceConfig::default()).unwrap();
        target.acquire_frame().unwrap();

        let red = QuadGradient::uniform(Color::new(1.0, 0.0, 0.0, 1.0));
        let blue = QuadGradient::uniform(Color::new(0.0, 0.0, 1.0, 1.0));
        let wide = Quad::new(PixelRect::new(0, 0, 2, 1), red, PixelRect::default());
        m.add_quad(wide, TextureId::NONE);
        m.add_quad(Quad::new(PixelRect::new(1, 0, 1, 1), blue, PixelRect::default()), TextureId(9));

        let stats = m.render(&mut store, &mut target, Filter::Nearest);
        assert_eq!(stats, FrameStats { batches: 2, quads: 2, fallback_quads: 1 });
        assert_eq!(target.back_buffer().get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(target.back_buffer().get_pixel(1, 0).0, [0, 0, 255, 255]);
    }

    #[test]
    fn add_after_render_starts_new_batch() {
        let mut m = BatchManager::new(8);
        let mut store = TextureStore::new();
        let mut target = SoftwareSurface::new(1, 1, SurfaceConfig::default()).unwrap();
        m.add_quad(quad_at(0), TextureId::NONE);
        m.render(&mut store, &mut target, Filter::Nearest);
        m.add_quad(quad_at(0), TextureId::NONE);
        assert_eq!(m.len(), 2);
    }
}
