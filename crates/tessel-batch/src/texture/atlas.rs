use std::sync::Arc;

use super::{clamp_priority, sealed, SnapshotQueue, SnapshotSlot, Texture, TextureError, TextureId};
use crate::coords::PixelRect;
use crate::paint::Color;
use crate::resource::{Image, ImageFactory};
use crate::surface::{self, BlitParams, DrawSurface, SurfaceStatus, VolatileSurface};

/// Upper bound on `validate()` calls per draw or write.
pub const MAX_VALIDATE_ATTEMPTS: usize = 8;

/// Recovery counters for one atlas.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AtlasStats {
    /// Surfaces re-created after a loss.
    pub reallocations: u64,
    /// Repaints from the newest snapshot.
    pub restores: u64,
    /// Snapshot updates handed to the worker.
    pub snapshot_requests: u64,
}

/// Shared surface subdivided by the caller into many sub-images.
///
/// Pixels live on a volatile surface the host may invalidate. Every mutating
/// write queues a snapshot of the surface; after a loss the atlas repaints
/// itself from the newest snapshot, including one the worker has not yet
/// published.
pub struct AtlasTexture {
    id: TextureId,
    width: u32,
    height: u32,
    priority: f32,
    factory: Arc<dyn ImageFactory>,
    surface: Option<Box<dyn VolatileSurface>>,
    slot: Arc<SnapshotSlot>,
    snapshots: SnapshotQueue,
    stats: AtlasStats,
}

impl AtlasTexture {
    pub fn new(
        id: TextureId,
        width: u32,
        height: u32,
        factory: Arc<dyn ImageFactory>,
        snapshots: SnapshotQueue,
    ) -> Self {
        let mut atlas = Self {
            id,
            width,
            height,
            priority: 1.0,
            factory,
            surface: None,
            slot: Arc::new(SnapshotSlot::new()),
            snapshots,
            stats: AtlasStats::default(),
        };
        atlas.allocate_surface();
        atlas
    }

    pub fn stats(&self) -> AtlasStats {
        self.stats
    }

    pub fn snapshot(&self) -> &Arc<SnapshotSlot> {
        &self.slot
    }

    /// Current surface pixels, if allocated.
    pub fn pixels(&self) -> Option<&image::RgbaImage> {
        self.surface.as_deref().map(|s| s.pixels())
    }

    fn allocate_surface(&mut self) {
        let mut fresh = self.factory.create_volatile_surface(self.width, self.height);
        fresh.set_acceleration_priority(self.priority);
        if let Some(mut old) = self.surface.replace(fresh) {
            old.flush();
        }
    }

    /// Brings the surface into a drawable state. Returns `false` when it stays
    /// unusable, in which case the caller must not touch it.
    fn validate(&mut self) -> bool {
        if self.surface.is_none() {
            log::debug!("re-allocating disposed atlas {}", self.id);
            self.allocate_surface();
        }

        let mut reallocated = false;
        let mut repaint = false;
        let mut ready = false;

        for _ in 0..MAX_VALIDATE_ATTEMPTS {
            let Some(surface) = self.surface.as_mut() else { break };
            match surface.validate() {
                SurfaceStatus::Valid if !surface.contents_lost() => {
                    ready = true;
                    break;
                }
                SurfaceStatus::Valid | SurfaceStatus::Restored => {
                    repaint = true;
                    ready = true;
                    break;
                }
                SurfaceStatus::Lost => {
                    repaint = true;
                    if !reallocated {
                        log::debug!("atlas {} surface lost; re-allocating", self.id);
                        self.allocate_surface();
                        self.stats.reallocations += 1;
                        reallocated = true;
                    }
                }
            }
        }

        if !ready {
            log::warn!(
                "atlas {} surface still invalid after {} validations; skipping",
                self.id,
                MAX_VALIDATE_ATTEMPTS
            );
            return false;
        }
        if repaint {
            self.restore_from_snapshot();
        }
        true
    }

    fn restore_from_snapshot(&mut self) {
        let Some(surface) = self.surface.as_mut() else { return };
        match self.slot.newest() {
            Some(snapshot) => {
                surface::write_region(surface.pixels_mut(), &snapshot, 0, 0);
                self.stats.restores += 1;
                log::debug!("atlas {} repainted from snapshot", self.id);
            }
            None => log::debug!("atlas {} has no snapshot yet; left blank", self.id),
        }
    }

    fn schedule_snapshot(&mut self) {
        let Some(surface) = self.surface.as_ref() else { return };
        self.snapshots.submit(&self.slot, surface.pixels().clone());
        self.stats.snapshot_requests += 1;
    }
}

impl sealed::Sealed for AtlasTexture {}

impl Texture for AtlasTexture {
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
        if !self.validate() {
            return;
        }
        if let Some(surface) = self.surface.as_mut() {
            surface::write_region(surface.pixels_mut(), image.pixels(), x, y);
        }
        self.schedule_snapshot();
    }

    fn draw_texture(
        &mut self,
        target: &mut dyn DrawSurface,
        dest: PixelRect,
        src: PixelRect,
        params: &BlitParams,
    ) -> Result<(), TextureError> {
        if self.surface.is_none() {
            return Err(TextureError::Disposed);
        }
        if !self.validate() {
            return Err(TextureError::SurfaceUnavailable);
        }
        let surface = self.surface.as_ref().ok_or(TextureError::SurfaceUnavailable)?;
        target.blit(surface.pixels(), src, dest, params);
        Ok(())
    }

    fn set_acceleration_priority(&mut self, priority: f32) {
        self.priority = clamp_priority(priority);
        if let Some(surface) = self.surface.as_mut() {
            surface.set_acceleration_priority(self.priority);
        }
    }

    fn acceleration_priority(&self) -> f32 {
        self.priority
    }

    fn clear(&mut self, color: Color) {
        if !self.validate() {
            return;
        }
        if let Some(surface) = self.surface.as_mut() {
            surface::fill_solid(surface.pixels_mut(), color.to_rgba8());
        }
        self.schedule_snapshot();
    }

    fn dispose(&mut self) {
        if let Some(mut surface) = self.surface.take() {
            surface.flush();
        }
        self.slot.clear();
    }

    fn is_disposed(&self) -> bool {
        self.surface.is_none()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use image::RgbaImage;

    use super::*;
    use crate::resource::SoftwareImageFactory;
    use crate::surface::{MemorySurface, SoftwareSurface, SurfaceConfig};
    use crate::texture::SnapshotWorker;

    /// Volatile surface replaying a shared script of statuses, then `Valid`.
    struct ScriptedSurface {
        inner: MemorySurface,
        script: Arc<Mutex<VecDeque<SurfaceStatus>>>,
        lost: bool,
    }

    impl VolatileSurface for ScriptedSurface {
        fn width(&self) -> u32 {
            self.inner.width()
        }
        fn height(&self) -> u32 {
            self.inner.height()
        }
        fn validate(&mut self) -> SurfaceStatus {
            let status = self.script.lock().unwrap().pop_front().unwrap_or(SurfaceStatus::Valid);
            if status != SurfaceStatus::Valid {
                self.lost = true;
                surface::fill_solid(self.inner.pixels_mut(), [0; 4]);
            } else {
                self.lost = false;
            }
            status
        }
        fn contents_lost(&self) -> bool {
            self.lost
        }
        fn pixels(&self) -> &RgbaImage {
            self.inner.pixels()
        }
        fn pixels_mut(&mut self) -> &mut RgbaImage {
            self.inner.pixels_mut()
        }
        fn set_acceleration_priority(&mut self, priority: f32) {
            self.inner.set_acceleration_priority(priority);
        }
        fn acceleration_priority(&self) -> f32 {
            self.inner.acceleration_priority()
        }
        fn flush(&mut self) {
            self.inner.flush();
        }
    }

    struct ScriptedFactory {
        script: Arc<Mutex<VecDeque<SurfaceStatus>>>,
    }

    impl ImageFactory for ScriptedFactory {
        fn create(&self, rgba: Vec<u8>, width: u32, height: u32) -> Image {
            SoftwareImageFactory.create(rgba, width, height)
        }
        fn create_volatile_surface(&self, width: u32, height: u32) -> Box<dyn VolatileSurface> {
            Box::new(ScriptedSurface {
                inner: MemorySurface::new(width, height),
                script: Arc::clone(&self.script),
                lost: false,
            })
        }
    }

    type Script = Arc<Mutex<VecDeque<SurfaceStatus>>>;

    fn scripted(statuses: &[SurfaceStatus]) -> (Arc<dyn ImageFactory>, Script) {
        let script = Arc::new(Mutex::new(VecDeque::new()));
        script.lock().unwrap().extend(statuses.iter().copied());
        (Arc::new(ScriptedFactory { script: Arc::clone(&script) }), script)
    }

    #[test]
    fn write_schedules_snapshot() {
        let worker = SnapshotWorker::spawn().unwrap();
        let mut atlas =
            AtlasTexture::new(TextureId(1), 8, 8, Arc::new(SoftwareImageFactory), worker.queue());
        atlas.write_image_to_texture(&Image::filled(2, 2, [255, 0, 0, 255]), 1, 1);
        worker.flush();

        let snap = atlas.snapshot().latest().unwrap();
        assert_eq!(snap.get_pixel(1, 1).0, [255, 0, 0, 255]);
        assert_eq!(atlas.stats().snapshot_requests, 1);
    }

    #[test]
    fn lost_lost_restored_reallocates_and_restores_once() {
        let worker = SnapshotWorker::spawn().unwrap();
        let (factory, script) = scripted(&[]);
        let mut atlas = AtlasTexture::new(TextureId(1), 4, 4, factory, worker.queue());
        atlas.write_image_to_texture(&Image::filled(4, 4, [0, 255, 0, 255]), 0, 0);
        worker.flush();

        script.lock().unwrap().extend([
            SurfaceStatus::Lost,
            SurfaceStatus::Lost,
            SurfaceStatus::Restored,
        ]);

        let mut target = SoftwareSurface::new(4, 4, SurfaceConfig::default()).unwrap();
        target.acquire_frame().unwrap();
        let r = PixelRect::of_size(4, 4);
        atlas.draw_texture(&mut target, r, r, &BlitParams::default()).unwrap();

        assert_eq!(atlas.stats().reallocations, 1);
        assert_eq!(atlas.stats().restores, 1);
        assert_eq!(target.back_buffer().get_pixel(2, 2).0, [0, 255, 0, 255]);
    }

    #[test]
    fn loss_before_publish_restores_the_last_write() {
        let (queue, jobs) = SnapshotQueue::detached();
        let (factory, script) = scripted(&[]);
        let mut atlas = AtlasTexture::new(TextureId(1), 4, 4, factory, queue);

        atlas.write_image_to_texture(&Image::filled(2, 2, [255, 0, 0, 255]), 0, 0);
        jobs.try_recv().unwrap();
        atlas.snapshot().publish_pending();

        // Second write stays in the mailbox when the surface goes away.
        atlas.write_image_to_texture(&Image::filled(2, 2, [0, 255, 0, 255]), 2, 2);
        script.lock().unwrap().extend([SurfaceStatus::Lost, SurfaceStatus::Restored]);

        let mut target = SoftwareSurface::new(4, 4, SurfaceConfig::default()).unwrap();
        target.acquire_frame().unwrap();
        let r = PixelRect::of_size(4, 4);
        atlas.draw_texture(&mut target, r, r, &BlitParams::default()).unwrap();
        assert_eq!(atlas.stats().restores, 1);
        assert_eq!(target.back_buffer().get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(target.back_buffer().get_pixel(3, 3).0, [0, 255, 0, 255]);

        // The late worker run changes nothing.
        jobs.try_recv().unwrap();
        atlas.snapshot().publish_pending();
        atlas.draw_texture(&mut target, r, r, &BlitParams::default()).unwrap();
        assert_eq!(atlas.pixels().unwrap().get_pixel(3, 3).0, [0, 255, 0, 255]);
        assert_eq!(target.back_buffer().get_pixel(3, 3).0, [0, 255, 0, 255]);
    }

    #[test]
    fn permanently_lost_surface_is_never_drawn() {
        let worker = SnapshotWorker::spawn().unwrap();
        let (factory, script) = scripted(&[]);
        let mut atlas = AtlasTexture::new(TextureId(1), 4, 4, factory, worker.queue());
        script.lock().unwrap().extend([SurfaceStatus::Lost; MAX_VALIDATE_ATTEMPTS]);

        let mut target = SoftwareSurface::new(4, 4, SurfaceConfig::default()).unwrap();
        target.acquire_frame().unwrap();
        let r = PixelRect::of_size(4, 4);
        assert_eq!(
            atlas.draw_texture(&mut target, r, r, &BlitParams::default()),
            Err(TextureError::SurfaceUnavailable)
        );
        assert_eq!(atlas.stats().reallocations, 1);
        assert_eq!(atlas.stats().restores, 0);
    }

    #[test]
    fn dispose_is_idempotent_and_clear_resurrects() {
        let worker = SnapshotWorker::spawn().unwrap();
        let mut atlas =
            AtlasTexture::new(TextureId(5), 4, 4, Arc::new(SoftwareImageFactory), worker.queue());
        atlas.dispose();
        atlas.dispose();
        assert!(atlas.is_disposed());

        atlas.clear(Color::WHITE);
        assert!(!atlas.is_disposed());
        assert_eq!(atlas.pixels().unwrap().get_pixel(0, 0).0, [255; 4]);
    }
}
