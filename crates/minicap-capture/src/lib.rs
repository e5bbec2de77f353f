//! minicap-capture — pull-based screen capture.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use minicap_capture::{create, frame_signal, resolve_display_info, start_thread_pool, FramebufferCompositor};
//! use minicap_core::DisplayInfo;
//!
//! # fn main() -> Result<(), minicap_core::CaptureError> {
//! let compositor = Arc::new(FramebufferCompositor::default());
//! start_thread_pool(compositor.as_ref());
//!
//! let native = resolve_display_info(compositor.as_ref(), 0)?;
//! let mut capturer = create(compositor, 0);
//! capturer.set_desired_info(&DisplayInfo::desired(native.width / 2, native.height / 2));
//!
//! let (notifier, mut waiter) = frame_signal();
//! capturer.set_frame_available_listener(Arc::new(notifier));
//! capturer.reconfigure()?;
//!
//! while waiter.blocking_wait() {
//!     let frame = capturer.request_frame()?;
//!     // frame.data: RGB888, `frame.stride` pixels per row
//!     frame.release();
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! ```text
//! consumer                 Capturer (ScreenshotSession)           Compositor
//! ────────                 ────────────────────────────           ──────────
//! reconfigure() ─────────► resolve_display_handle() ────────────► handle
//!   ◄──── on_frame_available()
//! request_frame() ───────► take_screenshot() ───────────────────► RGB565
//!                          rgb565_to_rgb888() → session buffer
//!   ◄──── Frame<'_> (borrows buffer)
//! frame.release() ───────► on_frame_available()
//! ```

pub mod compositor;
pub mod convert;
pub mod display;
pub mod fbdev;
pub mod notify;
pub mod session;

#[cfg(test)]
mod mock;

pub use compositor::{start_thread_pool, Compositor, DisplayConfig, DisplayHandle, Screenshot};
pub use convert::rgb565_to_rgb888;
pub use display::resolve_display_info;
pub use fbdev::FramebufferCompositor;
pub use notify::{frame_signal, FrameAvailableListener, FrameNotifier, FrameWaiter};
pub use session::{create, unpadded_rows, Capturer, Frame, ScreenshotSession, SessionState};
