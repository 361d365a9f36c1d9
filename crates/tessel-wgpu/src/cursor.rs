use std::sync::{Arc, Mutex, PoisonError};

use tessel_batch::resource::{
    decode_image, read_resource, CursorError, Image, MouseCursor, MouseCursorFactory,
    ResourceLoader,
};
use winit::event_loop::ActiveEventLoop;
use winit::window::{CursorIcon, CustomCursor, Window};

/// Cursor change waiting for the event loop.
#[derive(Debug, Clone)]
pub enum CursorRequest {
    Custom { image: Image, hotspot: (u16, u16) },
    Default,
}

impl CursorRequest {
    /// Installs the cursor on `window`. Must run on the event-loop thread.
    pub fn apply(self, event_loop: &ActiveEventLoop, window: &Window) {
        match self {
            CursorRequest::Default => window.set_cursor(CursorIcon::Default),
            CursorRequest::Custom { image, hotspot } => match custom_source(&image, hotspot) {
                Ok(source) => window.set_cursor(event_loop.create_custom_cursor(source)),
                Err(err) => log::warn!("custom cursor rejected: {err}"),
            },
        }
    }
}

/// Latest cursor request, shared between cursors and the host's event loop.
///
/// Cursors may be toggled from the render thread; winit only accepts cursor
/// changes on the event-loop thread, so the change is parked here.
#[derive(Debug, Clone, Default)]
pub struct CursorRequests {
    pending: Arc<Mutex<Option<CursorRequest>>>,
}

impl CursorRequests {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, request: CursorRequest) {
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(request);
    }

    pub fn take(&self) -> Option<CursorRequest> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    /// Applies the pending request, if any.
    pub fn apply(&self, event_loop: &ActiveEventLoop, window: &Window) {
        if let Some(request) = self.take() {
            request.apply(event_loop, window);
        }
    }
}

/// Custom window cursor.
pub struct WinitMouseCursor {
    image: Option<Image>,
    hotspot: (u16, u16),
    enabled: bool,
    requests: CursorRequests,
}

impl MouseCursor for WinitMouseCursor {
    fn hotspot(&self) -> (i32, i32) {
        (i32::from(self.hotspot.0), i32::from(self.hotspot.1))
    }

    fn enable(&mut self) {
        let Some(image) = self.image.clone() else {
            log::warn!("enable of disposed cursor ignored");
            return;
        };
        self.requests.push(CursorRequest::Custom { image, hotspot: self.hotspot });
        self.enabled = true;
    }

    fn disable(&mut self) {
        if self.enabled {
            self.requests.push(CursorRequest::Default);
            self.enabled = false;
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn dispose(&mut self) {
        self.disable();
        self.image = None;
    }

    fn image(&self) -> Option<&Image> {
        self.image.as_ref()
    }
}

/// Builds [`WinitMouseCursor`]s that report into one [`CursorRequests`].
#[derive(Debug, Clone, Default)]
pub struct WinitCursorFactory {
    requests: CursorRequests,
}

impl WinitCursorFactory {
    pub fn new(requests: CursorRequests) -> Self {
        Self { requests }
    }

    pub fn requests(&self) -> &CursorRequests {
        &self.requests
    }
}

impl MouseCursorFactory for WinitCursorFactory {
    fn create(
        &self,
        filename: &str,
        hotspot_x: i32,
        hotspot_y: i32,
        loader: &dyn ResourceLoader,
    ) -> Result<Box<dyn MouseCursor>, CursorError> {
        let bytes = read_resource(loader, filename)?;
        let image = Image::from_rgba(decode_image(filename, &bytes)?);

        let hotspot = match (u16::try_from(hotspot_x), u16::try_from(hotspot_y)) {
            (Ok(x), Ok(y)) => (x, y),
            _ => {
                return Err(CursorError::Platform(format!(
                    "hotspot ({hotspot_x},{hotspot_y}) out of range"
                )));
            }
        };
        // Reject images winit would refuse before any event loop is involved.
        custom_source(&image, hotspot).map_err(CursorError::Platform)?;

        Ok(Box::new(WinitMouseCursor {
            image: Some(image),
            hotspot,
            enabled: false,
            requests: self.requests.clone(),
        }))
    }
}

fn custom_source(
    image: &Image,
    hotspot: (u16, u16),
) -> Result<winit::window::CustomCursorSource, String> {
    let width = u16::try_from(image.width()).map_err(|_| "cursor image too wide".to_string())?;
    let height = u16::try_from(image.height()).map_err(|_| "cursor image too tall".to_string())?;
    CustomCursor::from_rgba(image.as_raw().to_vec(), width, height, hotspot.0, hotspot.1)
        .map_err(|err| err.to_string())
}
