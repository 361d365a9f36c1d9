//! Backend façade.
//!
//! [`BatchRenderBackend`] is the single entry point a scene engine talks to. It
//! exclusively owns the texture maps, the batch list and the cursor cache; the
//! scene engine only ever holds [`TextureId`]s and [`CursorHandle`]s.
//!
//! Per-call failures (unknown ids, missing files, undecodable images) are
//! logged and absorbed. Only construction can fail.

mod config;
mod cursors;

use std::sync::Arc;

use anyhow::{ensure, Context, Result};

use crate::batch::{BatchManager, BlendMode, Quad};
use crate::coords::Rect;
use crate::paint::QuadGradient;
use crate::pool::PoolStats;
use crate::resource::{
    decode_image, read_resource, CursorHandle, Image, MouseCursor, ResourceLoader,
};
use crate::surface::{DrawSurface, Filter};
use crate::texture::{
    AtlasStats, AtlasTexture, ImageTexture, SnapshotWorker, Texture, TextureId, TextureStore,
};

pub use crate::batch::FrameStats;
pub use config::{BackendConfig, Factories};
use cursors::CursorCache;

/// Batched immediate-mode 2D backend over a host surface `S`.
pub struct BatchRenderBackend<S: DrawSurface> {
    surface: S,
    factories: Factories,
    loader: Option<Arc<dyn ResourceLoader>>,
    config: BackendConfig,

    textures: TextureStore,
    batches: BatchManager,
    cursors: CursorCache,
    last_frame: FrameStats,

    // Dropped last: atlases hold queues into it.
    snapshots: SnapshotWorker,
}

impl<S: DrawSurface> BatchRenderBackend<S> {
    /// Creates a backend drawing into `surface`.
    ///
    /// Fails when the surface has no drawable area, the batch capacity is zero
    /// or the snapshot worker cannot be started.
    pub fn new(surface: S, factories: Factories, config: BackendConfig) -> Result<Self> {
        ensure!(
            surface.width() > 0 && surface.height() > 0,
            "drawing surface has no drawable area ({}x{})",
            surface.width(),
            surface.height()
        );
        ensure!(config.batch_capacity > 0, "batch capacity must be at least 1");

        let snapshots = SnapshotWorker::spawn().context("failed to start atlas snapshot worker")?;

        log::debug!(
            "batch backend created: {}x{}, batch capacity {}",
            surface.width(),
            surface.height(),
            config.batch_capacity
        );

        Ok(Self {
            surface,
            factories,
            loader: None,
            batches: BatchManager::new(config.batch_capacity),
            config,
            textures: TextureStore::new(),
            cursors: CursorCache::default(),
            last_frame: FrameStats::default(),
            snapshots,
        })
    }

    // ── host surface ─────────────────────────────────────────────────────

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Replaces the host surface, returning the previous one.
    pub fn set_surface(&mut self, surface: S) -> S {
        log::debug!("host surface replaced: {}x{}", surface.width(), surface.height());
        std::mem::replace(&mut self.surface, surface)
    }

    pub fn set_resource_loader(&mut self, loader: Arc<dyn ResourceLoader>) {
        self.loader = Some(loader);
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    // ── frame lifecycle ──────────────────────────────────────────────────

    /// Recycles last frame's batches and acquires a frame target.
    pub fn begin_frame(&mut self) {
        self.batches.begin_frame();
        if let Err(err) = self.surface.acquire_frame() {
            log::warn!("failed to acquire frame: {err}");
        }
    }

    pub fn end_frame(&mut self) {
        log::trace!(
            "frame ended: {} batches, {} quads",
            self.last_frame.batches,
            self.last_frame.quads
        );
    }

    /// Blanks the whole frame buffer.
    pub fn clear(&mut self) {
        self.surface.clear();
    }

    /// Draws every batch of the frame, then presents. Returns the number of
    /// batches drawn.
    pub fn render(&mut self) -> usize {
        let filter =
            if self.config.high_quality_textures { Filter::Bilinear } else { Filter::Nearest };
        let stats = self.batches.render(&mut self.textures, &mut self.surface, filter);
        self.last_frame = stats;

        if let Err(err) = self.surface.present() {
            log::warn!("failed to present frame: {err}");
        }
        stats.batches
    }

    pub fn last_frame_stats(&self) -> FrameStats {
        self.last_frame
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    pub fn batch_pool_stats(&self) -> PoolStats {
        self.batches.pool_stats()
    }

    // ── batching ─────────────────────────────────────────────────────────

    pub fn begin_batch(&mut self, blend_mode: BlendMode, texture_id: TextureId) {
        self.batches.begin_batch(blend_mode, texture_id);
    }

    /// Queues one quad. `dest` is in backend pixels, `src` in absolute texels
    /// of `texture_id` (ignored when unbound). Geometry is truncated to whole
    /// pixels; empty or non-finite quads are dropped.
    pub fn add_quad(&mut self, dest: Rect, colors: QuadGradient, src: Rect, texture_id: TextureId) {
        let Some(dest) = dest.to_pixels().filter(|r| !r.is_empty()) else {
            log::trace!("dropping empty quad {dest:?}");
            return;
        };
        let src = src.to_pixels().unwrap_or_default();
        log::trace!("add quad {dest:?} texture {texture_id}");
        self.batches.add_quad(Quad::new(dest, colors, src), texture_id);
    }

    /// Switches sampling for subsequent renders.
    pub fn use_high_quality_textures(&mut self, enabled: bool) {
        self.config.high_quality_textures = enabled;
    }

    pub fn fill_removed_images_in_atlas(&mut self, enabled: bool) {
        self.config.fill_removed_images = enabled;
    }

    // ── images ───────────────────────────────────────────────────────────

    /// Loads and decodes `filename` through the resource loader. Failures yield
    /// the zero-sized placeholder.
    pub fn load_image(&self, filename: &str) -> Image {
        let Some(loader) = self.loader.as_deref() else {
            log::warn!("no resource loader set; cannot load {filename}");
            return Image::placeholder();
        };
        match read_resource(loader, filename).and_then(|bytes| decode_image(filename, &bytes)) {
            Ok(pixels) => Image::from_rgba(pixels),
            Err(err) => {
                log::warn!("{err}");
                Image::placeholder()
            }
        }
    }

    /// Wraps tightly packed RGBA8 pixels.
    pub fn load_image_raw(&self, rgba: Vec<u8>, width: u32, height: u32) -> Image {
        self.factories.image.create(rgba, width, height)
    }

    // ── non-atlas textures ───────────────────────────────────────────────

    /// Returns [`TextureId::NONE`] once texture ids are exhausted.
    pub fn create_non_atlas_texture(&mut self, image: &Image) -> TextureId {
        let Some(id) = self.textures.allocate_id() else {
            return TextureId::NONE;
        };
        let mut texture = ImageTexture::from_image(id, image, Arc::clone(&self.factories.image));
        texture.set_acceleration_priority(self.config.non_atlas_priority);
        log::debug!("created texture {id} ({}x{})", image.width(), image.height());
        self.textures.insert_non_atlas(texture)
    }

    pub fn delete_non_atlas_texture(&mut self, id: TextureId) {
        if self.textures.remove_non_atlas(id) {
            log::debug!("deleted texture {id}");
        } else {
            log::warn!("delete of unknown texture {id} ignored");
        }
    }

    pub fn exists_non_atlas_texture(&self, id: TextureId) -> bool {
        self.textures.contains_non_atlas(id)
    }

    // ── atlases ──────────────────────────────────────────────────────────

    /// Allocates an atlas. Returns [`TextureId::NONE`] for a zero size or once
    /// texture ids are exhausted.
    pub fn create_texture_atlas(&mut self, width: u32, height: u32) -> TextureId {
        if width == 0 || height == 0 {
            log::warn!("refusing to create {width}x{height} atlas");
            return TextureId::NONE;
        }
        let Some(id) = self.textures.allocate_id() else {
            return TextureId::NONE;
        };
        let mut atlas = AtlasTexture::new(
            id,
            width,
            height,
            Arc::clone(&self.factories.image),
            self.snapshots.queue(),
        );
        atlas.set_acceleration_priority(self.config.atlas_priority);
        log::debug!("created atlas {id} ({width}x{height})");
        self.textures.insert_atlas(atlas)
    }

    pub fn atlas_size(&self, id: TextureId) -> Option<(u32, u32)> {
        self.textures.atlas(id).map(|a| (a.width(), a.height()))
    }

    pub fn atlas_stats(&self, id: TextureId) -> Option<AtlasStats> {
        self.textures.atlas(id).map(AtlasTexture::stats)
    }

    pub fn add_image_to_atlas(&mut self, image: &Image, x: i32, y: i32, atlas: TextureId) {
        match self.textures.atlas_mut(atlas) {
            Some(target) => target.write_image_to_texture(image, x, y),
            None => log::warn!("add image to unknown atlas {atlas} ignored"),
        }
    }

    /// Blanks the `width × height` region at `(x, y)` with transparent pixels,
    /// if the fill-removed-images policy is on.
    pub fn remove_image_from_atlas(
        &mut self,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        atlas: TextureId,
    ) {
        if !self.config.fill_removed_images {
            return;
        }
        let Some(target) = self.textures.atlas_mut(atlas) else {
            log::warn!("remove image from unknown atlas {atlas} ignored");
            return;
        };
        let len = width as usize * height as usize * 4;
        let blank = self.factories.buffer.create_byte_buffer(len);
        let image = self.factories.image.create(blank, width, height);
        target.write_image_to_texture(&image, x, y);
    }

    pub fn clear_texture_atlas(&mut self, atlas: TextureId) {
        let color = self.config.atlas_clear_color;
        match self.textures.atlas_mut(atlas) {
            Some(target) => target.clear(color),
            None => log::warn!("clear of unknown atlas {atlas} ignored"),
        }
    }

    /// Waits until every queued atlas snapshot is published.
    pub fn flush_snapshots(&self) {
        self.snapshots.flush();
    }

    // ── cursors ──────────────────────────────────────────────────────────

    /// Creates (or returns the cached) cursor for `filename`.
    pub fn create_mouse_cursor(
        &mut self,
        filename: &str,
        hotspot_x: i32,
        hotspot_y: i32,
    ) -> Option<CursorHandle> {
        if let Some(handle) = self.cursors.lookup(filename) {
            return Some(handle);
        }
        let Some(loader) = self.loader.as_deref() else {
            log::warn!("no resource loader set; cannot create cursor {filename}");
            return None;
        };
        match self.factories.cursor.create(filename, hotspot_x, hotspot_y, loader) {
            Ok(cursor) => {
                log::debug!("created cursor {filename} (hotspot {hotspot_x},{hotspot_y})");
                Some(self.cursors.insert(filename, cursor))
            }
            Err(err) => {
                log::warn!("failed to create cursor {filename}: {err}");
                None
            }
        }
    }

    pub fn enable_mouse_cursor(&mut self, handle: CursorHandle) {
        if !self.cursors.enable(handle) {
            log::warn!("enable of unknown cursor {handle:?} ignored");
        }
    }

    pub fn disable_mouse_cursor(&mut self) {
        self.cursors.disable();
    }

    /// The enabled cursor, for hosts that draw or install it themselves.
    pub fn active_cursor(&self) -> Option<&dyn MouseCursor> {
        self.cursors.active()
    }

    pub fn cursor_count(&self) -> usize {
        self.cursors.len()
    }
}

impl<S: DrawSurface> Drop for BatchRenderBackend<S> {
    fn drop(&mut self) {
        self.textures.dispose_all();
        self.cursors.dispose_all();
        log::debug!("batch backend disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Color;
    use crate::resource::MemoryResourceLoader;
    use crate::surface::{SoftwareSurface, SurfaceConfig};

    fn backend(w: u32, h: u32) -> BatchRenderBackend<SoftwareSurface> {
        let surface = SoftwareSurface::new(w, h, SurfaceConfig::default()).unwrap();
        BatchRenderBackend::new(surface, Factories::software(), BackendConfig::default()).unwrap()
    }

    fn png(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn zero_capacity_is_a_construction_failure() {
        let surface = SoftwareSurface::new(4, 4, SurfaceConfig::default()).unwrap();
        let config = BackendConfig { batch_capacity: 0, ..BackendConfig::default() };
        assert!(BatchRenderBackend::new(surface, Factories::software(), config).is_err());
    }

    #[test]
    fn ids_are_shared_between_kinds() {
        let mut b = backend(8, 8);
        let atlas = b.create_texture_atlas(16, 16);
        let tex = b.create_non_atlas_texture(&Image::filled(2, 2, [0; 4]));
        assert_eq!(atlas, TextureId(1));
        assert_eq!(tex, TextureId(2));
        assert!(b.exists_non_atlas_texture(tex));
        assert!(!b.exists_non_atlas_texture(atlas));
        assert_eq!(b.atlas_size(atlas), Some((16, 16)));
    }

    #[test]
    fn exhausted_ids_leave_live_textures_alone() {
        let mut b = backend(8, 8);
        b.textures = TextureStore::with_first_id(i32::MAX);
        let last = b.create_non_atlas_texture(&Image::filled(1, 1, [1, 2, 3, 255]));
        assert_eq!(last, TextureId(i32::MAX));

        assert_eq!(b.create_non_atlas_texture(&Image::filled(1, 1, [0; 4])), TextureId::NONE);
        assert_eq!(b.create_texture_atlas(4, 4), TextureId::NONE);
        assert!(b.exists_non_atlas_texture(last));
    }

    #[test]
    fn zero_sized_atlas_is_refused() {
        let mut b = backend(8, 8);
        assert_eq!(b.create_texture_atlas(0, 4), TextureId::NONE);
    }

    #[test]
    fn load_image_without_loader_is_placeholder() {
        let b = backend(4, 4);
        assert!(b.load_image("a.png").is_placeholder());
    }

    #[test]
    fn load_image_decodes_through_loader() {
        let mut b = backend(4, 4);
        b.set_resource_loader(Arc::new(
            MemoryResourceLoader::new().with("a.png", png(3, 2, [1, 2, 3, 255])),
        ));
        let img = b.load_image("a.png");
        assert_eq!((img.width(), img.height()), (3, 2));
        assert!(b.load_image("missing.png").is_placeholder());
    }

    #[test]
    fn load_image_raw_checks_length() {
        let b = backend(4, 4);
        assert!(b.load_image_raw(vec![0; 3], 1, 1).is_placeholder());
        assert_eq!(b.load_image_raw(vec![0; 4], 1, 1).width(), 1);
    }

    #[test]
    fn cursors_are_cached_by_filename() {
        let mut b = backend(4, 4);
        b.set_resource_loader(Arc::new(
            MemoryResourceLoader::new().with("hand.png", png(8, 8, [0, 0, 0, 255])),
        ));
        let first = b.create_mouse_cursor("hand.png", 1, 1).unwrap();
        let second = b.create_mouse_cursor("hand.png", 5, 5).unwrap();
        assert_eq!(first, second);
        assert_eq!(b.cursor_count(), 1);

        b.enable_mouse_cursor(first);
        assert_eq!(b.active_cursor().map(|c| c.hotspot()), Some((1, 1)));
        b.disable_mouse_cursor();
        assert!(b.active_cursor().is_none());
    }

    #[test]
    fn missing_cursor_yields_none() {
        let mut b = backend(4, 4);
        b.set_resource_loader(Arc::new(MemoryResourceLoader::new()));
        assert!(b.create_mouse_cursor("nope.png", 0, 0).is_none());
    }

    #[test]
    fn remove_image_only_with_fill_policy() {
        let mut b = backend(4, 4);
        let atlas = b.create_texture_atlas(4, 4);
        b.clear_texture_atlas(atlas);
        b.remove_image_from_atlas(1, 1, 2, 2, atlas);
        let px = |b: &BatchRenderBackend<SoftwareSurface>| {
            b.textures.atlas(atlas).unwrap().pixels().unwrap().get_pixel(1, 1).0
        };
        assert_eq!(px(&b), [255; 4]);

        b.fill_removed_images_in_atlas(true);
        b.remove_image_from_atlas(1, 1, 2, 2, atlas);
        assert_eq!(px(&b), [0; 4]);
        let corner = b.textures.atlas(atlas).unwrap().pixels().unwrap().get_pixel(0, 0).0;
        assert_eq!(corner, [255; 4]);
    }

    #[test]
    fn render_presents_and_reports_batches() {
        let mut b = backend(4, 4);
        b.begin_frame();
        b.add_quad(
            Rect::new(0.0, 0.0, 4.0, 4.0),
            Color::BLACK.into(),
            Rect::default(),
            TextureId::NONE,
        );
        assert_eq!(b.render(), 1);
        b.end_frame();
        assert_eq!(b.surface().presented_frames(), 1);
        assert_eq!(b.surface().front_buffer().unwrap().get_pixel(2, 2).0, [0, 0, 0, 255]);
    }

    #[test]
    fn truncated_quad_below_one_pixel_is_dropped() {
        let mut b = backend(4, 4);
        b.begin_frame();
        let sliver = Rect::new(0.0, 0.0, 0.9, 3.0);
        b.add_quad(sliver, Color::WHITE.into(), Rect::default(), TextureId::NONE);
        assert_eq!(b.batch_count(), 0);
    }

    #[test]
    fn unknown_ids_are_soft_failures() {
        let mut b = backend(4, 4);
        b.delete_non_atlas_texture(TextureId(42));
        b.add_image_to_atlas(&Image::filled(1, 1, [0; 4]), 0, 0, TextureId(42));
        b.clear_texture_atlas(TextureId(-1));
        assert!(b.atlas_size(TextureId(42)).is_none());
    }
}
