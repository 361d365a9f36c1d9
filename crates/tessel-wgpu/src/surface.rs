use anyhow::{Context, Result};
use image::RgbaImage;
use tessel_batch::batch::BlendMode;
use tessel_batch::coords::PixelRect;
use tessel_batch::paint::QuadGradient;
use tessel_batch::surface::{
    BlitParams, DrawSurface, SoftwareSurface, SurfaceConfig, SurfaceError,
};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::gpu::{to_surface_error, Gpu, GpuInit, SurfaceErrorAction};
use crate::presenter::Presenter;

/// Window-backed drawing surface.
///
/// Batches are composed into a [`SoftwareSurface`]; `present` uploads the
/// finished frame and shows it through the swapchain.
pub struct GpuSurface<'w> {
    gpu: Gpu<'w>,
    presenter: Presenter,
    canvas: SoftwareSurface,
}

impl<'w> GpuSurface<'w> {
    pub async fn new(window: &'w Window, init: GpuInit, config: SurfaceConfig) -> Result<Self> {
        let gpu = Gpu::new(window, init).await?;
        let size = gpu.size();
        let canvas = SoftwareSurface::new(size.width, size.height, config)
            .context("failed to allocate frame canvas")?;
        let presenter = Presenter::new(gpu.device(), gpu.surface_format());
        Ok(Self { gpu, presenter, canvas })
    }

    pub fn new_blocking(window: &'w Window, init: GpuInit, config: SurfaceConfig) -> Result<Self> {
        pollster::block_on(Self::new(window, init, config))
    }

    pub fn gpu(&self) -> &Gpu<'w> {
        &self.gpu
    }

    pub fn canvas(&self) -> &SoftwareSurface {
        &self.canvas
    }

    /// Follows a window resize. Zero sizes keep the previous canvas.
    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        self.gpu.resize(size);
        if size.width > 0 && size.height > 0 {
            self.canvas.resize(size.width, size.height);
        }
    }
}

/// Uploads `pixels` and shows them on the next swapchain image.
fn show(
    gpu: &mut Gpu<'_>,
    presenter: &mut Presenter,
    pixels: &RgbaImage,
) -> Result<(), SurfaceError> {
    presenter.upload(gpu.device(), gpu.queue(), pixels);

    let mut frame = match gpu.begin_frame() {
        Ok(frame) => frame,
        Err(err) => {
            let action = gpu.handle_surface_error(&err);
            log::debug!("swapchain error {err}: {action:?}");
            return Err(to_surface_error(&err));
        }
    };
    presenter.draw(&mut frame.encoder, &frame.view);
    gpu.submit(frame);
    Ok(())
}

impl DrawSurface for GpuSurface<'_> {
    fn width(&self) -> u32 {
        self.canvas.width()
    }

    fn height(&self) -> u32 {
        self.canvas.height()
    }

    fn acquire_frame(&mut self) -> Result<(), SurfaceError> {
        let size = self.gpu.size();
        if size.width == 0 || size.height == 0 {
            // Minimized: nothing can be presented.
            return Err(SurfaceError::Timeout);
        }
        self.canvas.acquire_frame()
    }

    fn fill_rect(&mut self, dest: PixelRect, paint: &QuadGradient, blend: BlendMode) {
        self.canvas.fill_rect(dest, paint, blend);
    }

    fn blit(&mut self, image: &RgbaImage, src: PixelRect, dest: PixelRect, params: &BlitParams) {
        self.canvas.blit(image, src, dest, params);
    }

    fn clear(&mut self) {
        self.canvas.clear();
    }

    fn present(&mut self) -> Result<(), SurfaceError> {
        self.canvas.present()?;
        let Some(front) = self.canvas.front_buffer() else { return Ok(()) };
        show(&mut self.gpu, &mut self.presenter, front)
    }
}

impl SurfaceErrorAction {
    /// Action for a backend-neutral present error.
    pub fn for_error(err: &SurfaceError) -> Self {
        match err {
            SurfaceError::Lost | SurfaceError::Outdated => SurfaceErrorAction::Reconfigured,
            SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
            SurfaceError::Timeout | SurfaceError::Other(_) => SurfaceErrorAction::SkipFrame,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_errors_map_to_actions() {
        assert_eq!(
            SurfaceErrorAction::for_error(&SurfaceError::OutOfMemory),
            SurfaceErrorAction::Fatal
        );
        assert_eq!(
            SurfaceErrorAction::for_error(&SurfaceError::Outdated),
            SurfaceErrorAction::Reconfigured
        );
        assert_eq!(
            SurfaceErrorAction::for_error(&SurfaceError::Other("x".into())),
            SurfaceErrorAction::SkipFrame
        );
    }
}
