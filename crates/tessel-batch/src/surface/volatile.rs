use image::RgbaImage;

/// Result of validating a volatile surface against the host environment.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceStatus {
    /// Surface and contents are intact.
    Valid,
    /// Surface is usable again but its contents were discarded.
    Restored,
    /// Surface is unusable (incompatible or released); it must be reallocated.
    Lost,
}

/// Acceleratable pixel surface whose contents the host may discard at any time.
///
/// Callers validate before every read or write and repair the surface
/// according to the reported [`SurfaceStatus`].
pub trait VolatileSurface: Send {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Re-checks the surface against the host environment.
    fn validate(&mut self) -> SurfaceStatus;

    /// True when contents were lost since the last `validate`.
    fn contents_lost(&self) -> bool;

    fn pixels(&self) -> &RgbaImage;
    fn pixels_mut(&mut self) -> &mut RgbaImage;

    /// Hint in `[0, 1]` for how strongly to keep the surface in fast memory.
    fn set_acceleration_priority(&mut self, priority: f32);
    fn acceleration_priority(&self) -> f32;

    /// Releases backing memory. A flushed surface reports [`SurfaceStatus::Lost`].
    fn flush(&mut self);
}

/// Plain-memory volatile surface. Never loses contents unless flushed.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    width: u32,
    height: u32,
    pixels: RgbaImage,
    priority: f32,
    flushed: bool,
}

impl MemorySurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: RgbaImage::new(width, height),
            priority: 0.5,
            flushed: false,
        }
    }
}

impl VolatileSurface for MemorySurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn validate(&mut self) -> SurfaceStatus {
        if self.flushed { SurfaceStatus::Lost } else { SurfaceStatus::Valid }
    }

    fn contents_lost(&self) -> bool {
        self.flushed
    }

    fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    fn pixels_mut(&mut self) -> &mut RgbaImage {
        &mut self.pixels
    }

    fn set_acceleration_priority(&mut self, priority: f32) {
        self.priority = priority;
    }

    fn acceleration_priority(&self) -> f32 {
        self.priority
    }

    fn flush(&mut self) {
        self.pixels = RgbaImage::new(0, 0);
        self.flushed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_surface_stays_valid() {
        let mut s = MemorySurface::new(4, 3);
        assert_eq!(s.validate(), SurfaceStatus::Valid);
        assert!(!s.contents_lost());
        assert_eq!(s.pixels().dimensions(), (4, 3));
    }

    #[test]
    fn flushed_surface_reports_lost() {
        let mut s = MemorySurface::new(4, 3);
        s.flush();
        assert_eq!(s.validate(), SurfaceStatus::Lost);
        assert!(s.contents_lost());
    }
}
