//! The narrow slice of the display compositor that capture depends on.

use std::sync::Once;

use minicap_core::{Orientation, PixelFormat, Status};
use tracing::info;

/// Opaque reference to one display, issued by a [`Compositor`].
///
/// Handles are only meaningful to the compositor that produced them and may
/// go stale when the display disappears; sessions re-resolve on every
/// reconfiguration instead of caching them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayHandle(u64);

impl DisplayHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// One supported display mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayConfig {
    pub width:       u32,
    pub height:      u32,
    pub orientation: Orientation,
    pub fps:         f32,
    pub density:     f32,
    pub xdpi:        f32,
    pub ydpi:        f32,
    pub secure:      bool,
}

/// Result of one synchronous whole-screen snapshot.
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// Raw pixels, `stride * height` pixels of 16-bit RGB565.
    pub pixels: Vec<u8>,
    pub width:  u32,
    pub height: u32,
    /// Row length in pixels, including padding.
    pub stride: u32,
    /// Format the compositor *reports*. Some compositors claim RGBA_8888 for
    /// what is really RGB565 data; the session converts as RGB565 regardless.
    pub format: PixelFormat,
}

/// Display compositor / window-system service.
///
/// All calls are blocking IPC round-trips on a real device.
pub trait Compositor: Send + Sync {
    /// Start the process's IPC thread pool. Called once via
    /// [`start_thread_pool`].
    fn start_thread_pool(&self) {}

    fn resolve_display_handle(&self, display_id: i32) -> Result<DisplayHandle, Status>;

    fn display_configs(&self, handle: &DisplayHandle) -> Result<Vec<DisplayConfig>, Status>;

    /// Index into [`display_configs`](Self::display_configs) of the active mode.
    /// Not guaranteed to be in range.
    fn active_config(&self, handle: &DisplayHandle) -> i32;

    fn take_screenshot(&self, handle: &DisplayHandle) -> Result<Screenshot, Status>;
}

static THREAD_POOL: Once = Once::new();

/// Process-wide, one-time IPC thread-pool start. Must run before the first
/// compositor call; later calls are no-ops.
pub fn start_thread_pool(compositor: &dyn Compositor) {
    THREAD_POOL.call_once(|| {
        compositor.start_thread_pool();
        info!("Compositor IPC thread pool started");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockCompositor;

    #[test]
    fn thread_pool_starts_once() {
        let a = MockCompositor::phone();
        let b = MockCompositor::phone();
        start_thread_pool(&a);
        start_thread_pool(&a);
        start_thread_pool(&b);
        assert_eq!(a.calls().thread_pool, 1);
        assert_eq!(b.calls().thread_pool, 0);
    }
}
