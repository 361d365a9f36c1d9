use anyhow::Result;
use image::RgbaImage;

use super::{raster, BlitParams, DrawSurface, FlipContents, SurfaceConfig, SurfaceError};
use crate::batch::BlendMode;
use crate::coords::PixelRect;
use crate::paint::QuadGradient;

/// CPU drawing surface with `buffer_count` rotating RGBA8 frame buffers.
///
/// Draw calls go to the back buffer; [`present`](DrawSurface::present) makes it
/// the front buffer and moves on to the next one.
pub struct SoftwareSurface {
    config: SurfaceConfig,
    width: u32,
    height: u32,
    buffers: Vec<RgbaImage>,
    back: usize,
    front: Option<usize>,
    presented_frames: u64,
}

impl SoftwareSurface {
    /// Allocates the frame buffers.
    ///
    /// Fails for a zero-sized surface or an unsupported buffer count; a backend
    /// cannot be built without a drawable surface.
    pub fn new(width: u32, height: u32, config: SurfaceConfig) -> Result<Self> {
        anyhow::ensure!(width > 0 && height > 0, "surface has zero size ({width}x{height})");
        anyhow::ensure!(
            (1..=3).contains(&config.buffer_count),
            "unsupported buffer count {} (expected 1..=3)",
            config.buffer_count
        );

        let background = config.background.to_rgba8();
        let buffers = (0..config.buffer_count)
            .map(|_| RgbaImage::from_pixel(width, height, image::Rgba(background)))
            .collect();

        log::debug!(
            "software surface {width}x{height}, {} buffer(s), {:?}",
            config.buffer_count,
            config.alpha_mode
        );

        Ok(Self {
            config,
            width,
            height,
            buffers,
            back: 0,
            front: None,
            presented_frames: 0,
        })
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    /// The last presented frame, if any.
    pub fn front_buffer(&self) -> Option<&RgbaImage> {
        self.front.map(|i| &self.buffers[i])
    }

    /// The buffer currently being drawn.
    pub fn back_buffer(&self) -> &RgbaImage {
        &self.buffers[self.back]
    }

    pub fn presented_frames(&self) -> u64 {
        self.presented_frames
    }

    /// Reallocates all buffers at a new size. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 || (width == self.width && height == self.height) {
            return;
        }
        let background = self.config.background.to_rgba8();
        for buffer in &mut self.buffers {
            *buffer = RgbaImage::from_pixel(width, height, image::Rgba(background));
        }
        self.width = width;
        self.height = height;
        self.front = None;
    }
}

impl DrawSurface for SoftwareSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn acquire_frame(&mut self) -> Result<(), SurfaceError> {
        Ok(())
    }

    fn fill_rect(&mut self, dest: PixelRect, paint: &QuadGradient, blend: BlendMode) {
        let alpha = self.config.alpha_mode;
        raster::fill(&mut self.buffers[self.back], dest, paint, blend, alpha);
    }

    fn blit(&mut self, image: &RgbaImage, src: PixelRect, dest: PixelRect, params: &BlitParams) {
        let alpha = self.config.alpha_mode;
        raster::blit(&mut self.buffers[self.back], image, src, dest, params, alpha);
    }

    fn clear(&mut self) {
        let background = self.config.background.to_rgba8();
        raster::fill_solid(&mut self.buffers[self.back], background);
    }

    fn present(&mut self) -> Result<(), SurfaceError> {
        let presented = self.back;
        self.front = Some(presented);
        self.presented_frames += 1;

        let count = self.buffers.len();
        if count == 1 {
            return Ok(());
        }

        self.back = (presented + 1) % count;
        match self.config.flip_contents {
            FlipContents::Prior => {
                let (src, dst) = pick_two(&mut self.buffers, presented, self.back);
                dst.copy_from_slice(src);
            }
            FlipContents::Background => self.clear(),
        }
        Ok(())
    }
}

/// Borrows `a` immutably and `b` mutably from the same slice (`a != b`).
fn pick_two(buffers: &mut [RgbaImage], a: usize, b: usize) -> (&RgbaImage, &mut RgbaImage) {
    debug_assert_ne!(a, b);
    if a < b {
        let (lo, hi) = buffers.split_at_mut(b);
        (&lo[a], &mut hi[0])
    } else {
        let (lo, hi) = buffers.split_at_mut(a);
        (&hi[0], &mut lo[b])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Color;
    use crate::surface::AlphaMode;

    fn surface(buffers: usize, flip: FlipContents) -> SoftwareSurface {
        SoftwareSurface::new(
            4,
            4,
            SurfaceConfig {
                buffer_count: buffers,
                flip_contents: flip,
                ..SurfaceConfig::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn zero_size_is_a_construction_failure() {
        assert!(SoftwareSurface::new(0, 10, SurfaceConfig::default()).is_err());
    }

    #[test]
    fn zero_buffers_is_a_construction_failure() {
        let config = SurfaceConfig { buffer_count: 0, ..SurfaceConfig::default() };
        assert!(SoftwareSurface::new(4, 4, config).is_err());
    }

    #[test]
    fn present_exposes_drawn_frame() {
        let mut s = surface(2, FlipContents::Prior);
        assert!(s.front_buffer().is_none());
        let white = QuadGradient::uniform(Color::WHITE);
        s.fill_rect(PixelRect::new(0, 0, 2, 2), &white, BlendMode::Blend);
        s.present().unwrap();
        let front = s.front_buffer().unwrap();
        assert_eq!(front.get_pixel(1, 1).0, [255; 4]);
        assert_eq!(front.get_pixel(3, 3).0, [0; 4]);
    }

    #[test]
    fn prior_flip_carries_contents_to_next_back_buffer() {
        let mut s = surface(3, FlipContents::Prior);
        let white = QuadGradient::uniform(Color::WHITE);
        s.fill_rect(PixelRect::new(0, 0, 1, 1), &white, BlendMode::Blend);
        s.present().unwrap();
        assert_eq!(s.back_buffer().get_pixel(0, 0).0, [255; 4]);
    }

    #[test]
    fn background_flip_clears_next_back_buffer() {
        let mut s = surface(2, FlipContents::Background);
        let white = QuadGradient::uniform(Color::WHITE);
        s.fill_rect(PixelRect::new(0, 0, 1, 1), &white, BlendMode::Blend);
        s.present().unwrap();
        assert_eq!(s.back_buffer().get_pixel(0, 0).0, [0; 4]);
        assert_eq!(s.presented_frames(), 1);
    }

    #[test]
    fn clear_uses_background_color() {
        let config = SurfaceConfig {
            background: Color::BLACK,
            alpha_mode: AlphaMode::Straight,
            ..SurfaceConfig::default()
        };
        let mut s = SoftwareSurface::new(2, 2, config).unwrap();
        let white = QuadGradient::uniform(Color::WHITE);
        s.fill_rect(PixelRect::new(0, 0, 2, 2), &white, BlendMode::Blend);
        s.clear();
        assert!(s.back_buffer().pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn resize_reallocates_buffers() {
        let mut s = surface(2, FlipContents::Prior);
        s.resize(8, 6);
        assert_eq!((s.width(), s.height()), (8, 6));
        assert_eq!(s.back_buffer().dimensions(), (8, 6));
    }
}
