//! In-memory compositor for tests.

use std::sync::Mutex;

use minicap_core::{Orientation, PixelFormat, Status};

use crate::compositor::{Compositor, DisplayConfig, DisplayHandle, Screenshot};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Calls {
    pub thread_pool: u32,
    pub resolve:     u32,
    pub configs:     u32,
    pub active:      u32,
    pub screenshot:  u32,
}

struct State {
    display_id:       i32,
    configs:          Vec<DisplayConfig>,
    active:           i32,
    resolve_error:    Option<Status>,
    configs_error:    Option<Status>,
    screenshot_error: Option<Status>,
    /// Overrides the screenshot geometry `(width, height, stride)`.
    geometry:         Option<(u32, u32, u32)>,
    truncate_pixels:  bool,
    next_handle:      u64,
    calls:            Calls,
}

pub struct MockCompositor {
    state: Mutex<State>,
}

impl MockCompositor {
    pub fn new(display_id: i32, configs: Vec<DisplayConfig>, active: i32) -> Self {
        Self {
            state: Mutex::new(State {
                display_id,
                configs,
                active,
                resolve_error: None,
                configs_error: None,
                screenshot_error: None,
                geometry: None,
                truncate_pixels: false,
                next_handle: 1,
                calls: Calls::default(),
            }),
        }
    }

    /// Display 0, a single 1080×1920 mode at 400 dpi.
    pub fn phone() -> Self {
        Self::new(0, vec![phone_config()], 0)
    }

    /// Display 0 with a small 16×4 (stride 24) mode for capture tests.
    pub fn small() -> Self {
        let mock = Self::phone();
        mock.set_geometry(16, 4, 24);
        mock
    }

    pub fn calls(&self) -> Calls {
        self.lock().calls
    }

    pub fn set_active(&self, active: i32) {
        self.lock().active = active;
    }

    /// Make the display disappear (`Some`) or come back (`None`).
    pub fn fail_resolve(&self, status: Option<Status>) {
        self.lock().resolve_error = status;
    }

    pub fn fail_configs(&self, status: Option<Status>) {
        self.lock().configs_error = status;
    }

    pub fn fail_screenshot(&self, status: Option<Status>) {
        self.lock().screenshot_error = status;
    }

    pub fn set_geometry(&self, width: u32, height: u32, stride: u32) {
        self.lock().geometry = Some((width, height, stride));
    }

    pub fn truncate_pixels(&self) {
        self.lock().truncate_pixels = true;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

pub fn phone_config() -> DisplayConfig {
    DisplayConfig {
        width:       1080,
        height:      1920,
        orientation: Orientation::Deg0,
        fps:         60.0,
        density:     2.75,
        xdpi:        400.0,
        ydpi:        400.0,
        secure:      true,
    }
}

impl Compositor for MockCompositor {
    fn start_thread_pool(&self) {
        self.lock().calls.thread_pool += 1;
    }

    fn resolve_display_handle(&self, display_id: i32) -> Result<DisplayHandle, Status> {
        let mut st = self.lock();
        st.calls.resolve += 1;
        if let Some(status) = st.resolve_error {
            return Err(status);
        }
        if display_id != st.display_id {
            return Err(Status::NAME_NOT_FOUND);
        }
        // Fresh handle per resolution so tests can tell them apart.
        let handle = DisplayHandle::new(st.next_handle);
        st.next_handle += 1;
        Ok(handle)
    }

    fn display_configs(&self, _handle: &DisplayHandle) -> Result<Vec<DisplayConfig>, Status> {
        let mut st = self.lock();
        st.calls.configs += 1;
        match st.configs_error {
            Some(status) => Err(status),
            None => Ok(st.configs.clone()),
        }
    }

    fn active_config(&self, _handle: &DisplayHandle) -> i32 {
        let mut st = self.lock();
        st.calls.active += 1;
        st.active
    }

    fn take_screenshot(&self, _handle: &DisplayHandle) -> Result<Screenshot, Status> {
        let mut st = self.lock();
        st.calls.screenshot += 1;
        if let Some(status) = st.screenshot_error {
            return Err(status);
        }
        let (width, height, stride) = st.geometry.unwrap_or_else(|| {
            let c = st.configs.first().copied().unwrap_or_else(phone_config);
            (c.width, c.height, c.width)
        });

        // Every shot is a different solid-ish pattern.
        let seed = st.calls.screenshot as u16;
        let count = (stride * height) as usize;
        let mut pixels: Vec<u8> = (0..count)
            .flat_map(|i| (i as u16).wrapping_mul(31).wrapping_add(seed.wrapping_mul(0x0841)).to_le_bytes())
            .collect();
        if st.truncate_pixels {
            pixels.truncate(pixels.len() / 2);
        }

        Ok(Screenshot { pixels, width, height, stride, format: PixelFormat::Rgba8888 })
    }
}
