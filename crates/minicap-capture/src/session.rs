//! Screenshot-based capture session.
//!
//! # Lifecycle
//!
//! ```text
//!            reconfigure() ok            release()
//! Unbound ─────────────────────► Bound ─────────────► Released
//!    ▲                             │
//!    └──── reconfigure() failed ───┘
//! ```
//!
//! Every `reconfigure()` resolves the display handle again, so a display that
//! went away (screen off, unplugged) shows up as a resolution error rather than
//! a read through a stale handle.
//!
//! # Frames
//!
//! `request_frame()` takes one blocking snapshot, widens it RGB565 → RGB888
//! into a buffer the session owns, and hands back a [`Frame`] borrowing that
//! buffer. The buffer is allocated on first use and reused for every later
//! frame, so a frame must be consumed (encoded, copied) before the next
//! request. The borrow checker enforces this.
//!
//! There is no internal locking; a session belongs to one capture thread.

use std::fmt;
use std::sync::Arc;

use minicap_core::{CaptureError, CaptureMethod, DisplayInfo, PixelFormat, Status};
use tracing::{debug, error, info, warn};

use crate::compositor::{Compositor, DisplayHandle};
use crate::convert::rgb565_to_rgb888;
use crate::notify::FrameAvailableListener;

// ── Capturer ──────────────────────────────────────────────────────────────────

/// Capture backend as seen by the consumer.
pub trait Capturer: Send {
    fn capture_method(&self) -> CaptureMethod;

    fn display_id(&self) -> i32;

    /// Record the output size the consumer would like. Advisory.
    fn set_desired_info(&mut self, info: &DisplayInfo);

    /// Register the frame-available listener, replacing any previous one.
    fn set_frame_available_listener(&mut self, listener: Arc<dyn FrameAvailableListener>);

    /// Bind to the display and announce that a frame may be pulled.
    fn reconfigure(&mut self) -> Result<(), CaptureError>;

    /// Capture one frame. Blocks for the duration of the snapshot.
    fn request_frame(&mut self) -> Result<Frame<'_>, CaptureError>;

    /// Drop the display binding. Idempotent.
    fn release(&mut self);
}

/// Create a capture session for `display_id`. The session starts unbound.
pub fn create(compositor: Arc<dyn Compositor>, display_id: i32) -> Box<dyn Capturer> {
    Box::new(ScreenshotSession::new(compositor, display_id))
}

// ── Frame ─────────────────────────────────────────────────────────────────────

/// Screenshot layout the converter reads.
const SRC_BPP: usize = bpp(PixelFormat::Rgb565);
/// Layout of every delivered frame.
const OUT_BPP: usize = bpp(PixelFormat::Rgb888);

const fn bpp(format: PixelFormat) -> usize {
    match format.bytes_per_pixel() {
        Some(n) => n as usize,
        None => 0,
    }
}

/// One captured RGB888 image, borrowed from its session.
pub struct Frame<'a> {
    pub data:   &'a [u8],
    pub format: PixelFormat,
    pub width:  u32,
    pub height: u32,
    /// Row length in pixels; may exceed `width`.
    pub stride: u32,
    /// Bytes per pixel.
    pub bpp:    u32,
    /// `stride * height * bpp`
    pub size:   usize,
    listener:   Option<&'a dyn FrameAvailableListener>,
}

impl Frame<'_> {
    /// Hand the frame back. The buffer stays with the session; this only
    /// tells the consumer's listener that the next frame may be pulled.
    pub fn release(self) {
        match self.listener {
            Some(listener) => listener.on_frame_available(),
            None => debug!("frame released with no listener registered"),
        }
    }

    /// Pixel rows without stride padding.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        unpadded_rows(self.data, self.width, self.stride, self.bpp)
    }
}

/// Split an image of `stride`-pixel rows into rows of `width` pixels,
/// dropping the padding. A trailing partial row is skipped.
pub fn unpadded_rows(data: &[u8], width: u32, stride: u32, bpp: u32) -> impl Iterator<Item = &[u8]> {
    let row_bytes = width as usize * bpp as usize;
    data.chunks_exact((stride as usize * bpp as usize).max(1))
        .map(move |row| &row[..row_bytes])
}

impl fmt::Debug for Frame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("bpp", &self.bpp)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

// ── ScreenshotSession ─────────────────────────────────────────────────────────

/// Observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unbound,
    Bound,
    Released,
}

#[derive(Debug, Clone, Copy)]
enum Binding {
    Unbound,
    Bound(DisplayHandle),
    Released,
}

/// Capture session that takes one synchronous whole-screen snapshot per
/// request.
pub struct ScreenshotSession {
    compositor:     Arc<dyn Compositor>,
    display_id:     i32,
    binding:        Binding,
    desired_width:  u32,
    desired_height: u32,
    listener:       Option<Arc<dyn FrameAvailableListener>>,
    /// RGB888 conversion target, reused across frames.
    buffer:         Vec<u8>,
}

impl ScreenshotSession {
    pub fn new(compositor: Arc<dyn Compositor>, display_id: i32) -> Self {
        Self {
            compositor,
            display_id,
            binding: Binding::Unbound,
            desired_width: 0,
            desired_height: 0,
            listener: None,
            buffer: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        match self.binding {
            Binding::Unbound => SessionState::Unbound,
            Binding::Bound(_) => SessionState::Bound,
            Binding::Released => SessionState::Released,
        }
    }

    /// Handle from the most recent successful `reconfigure()`.
    pub fn handle(&self) -> Option<DisplayHandle> {
        match self.binding {
            Binding::Bound(handle) => Some(handle),
            _ => None,
        }
    }

    /// Desired geometry last set by the consumer (0×0 if never set).
    pub fn desired_info(&self) -> DisplayInfo {
        DisplayInfo::desired(self.desired_width, self.desired_height)
    }

    /// Bytes currently allocated for conversion output.
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    fn notify_frame_available(&self) {
        match &self.listener {
            Some(listener) => listener.on_frame_available(),
            None => debug!("Display[{}] no frame listener registered", self.display_id),
        }
    }
}

impl Capturer for ScreenshotSession {
    fn capture_method(&self) -> CaptureMethod {
        CaptureMethod::Screenshot
    }

    fn display_id(&self) -> i32 {
        self.display_id
    }

    fn set_desired_info(&mut self, info: &DisplayInfo) {
        // Recorded only; frames keep the compositor's geometry.
        self.desired_width = info.width;
        self.desired_height = info.height;
        debug!("Display[{}] desired {}x{}", self.display_id, info.width, info.height);
    }

    fn set_frame_available_listener(&mut self, listener: Arc<dyn FrameAvailableListener>) {
        self.listener = Some(listener);
    }

    fn reconfigure(&mut self) -> Result<(), CaptureError> {
        if let Binding::Released = self.binding {
            warn!("Display[{}] reconfigure() on released session", self.display_id);
            return Err(CaptureError::Released { display_id: self.display_id });
        }

        match self.compositor.resolve_display_handle(self.display_id) {
            Ok(handle) => {
                self.binding = Binding::Bound(handle);
                info!("Display[{}] bound (handle {:#x})", self.display_id, handle.raw());
            }
            Err(status) => {
                self.binding = Binding::Unbound;
                error!("Unable to get handle for display {}: {}", self.display_id, status);
                return Err(CaptureError::Resolution { display_id: self.display_id, status });
            }
        }

        self.notify_frame_available();
        Ok(())
    }

    fn request_frame(&mut self) -> Result<Frame<'_>, CaptureError> {
        let Binding::Bound(handle) = self.binding else {
            warn!("Display[{}] request_frame() while {:?}", self.display_id, self.state());
            return Err(CaptureError::Capture { status: Status::NO_INIT });
        };

        let shot = self.compositor.take_screenshot(&handle).map_err(|status| {
            error!("take_screenshot() failed: {}", status);
            CaptureError::Capture { status }
        })?;

        if shot.stride < shot.width {
            error!("Screenshot stride {} < width {}", shot.stride, shot.width);
            return Err(CaptureError::Capture { status: Status::BAD_VALUE });
        }
        let pixels = shot.stride as usize * shot.height as usize;
        if shot.pixels.len() < pixels * SRC_BPP {
            error!(
                "Screenshot holds {} bytes, {}x{} (stride {}) needs {}",
                shot.pixels.len(), shot.width, shot.height, shot.stride, pixels * SRC_BPP
            );
            return Err(CaptureError::Capture { status: Status::NOT_ENOUGH_DATA });
        }

        let size = pixels * OUT_BPP;
        if self.buffer.len() < size {
            debug!("Display[{}] conversion buffer {} → {} bytes", self.display_id, self.buffer.len(), size);
            self.buffer.resize(size, 0);
        }
        rgb565_to_rgb888(&shot.pixels[..pixels * SRC_BPP], &mut self.buffer[..size]);

        Ok(Frame {
            data:     &self.buffer[..size],
            format:   PixelFormat::Rgb888,
            width:    shot.width,
            height:   shot.height,
            stride:   shot.stride,
            bpp:      OUT_BPP as u32,
            size,
            listener: self.listener.as_deref(),
        })
    }

    fn release(&mut self) {
        if let Binding::Released = self.binding {
            return;
        }
        self.binding = Binding::Released;
        self.buffer = Vec::new();
        debug!("Display[{}] session released", self.display_id);
    }
}

impl Drop for ScreenshotSession {
    fn drop(&mut self) {
        self.release();
    }
}
