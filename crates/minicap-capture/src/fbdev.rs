//! Linux framebuffer (fbdev) compositor backend.
//!
//! Display `N` is `/sys/class/graphics/fbN` + `/dev/fbN`. Mode information
//! comes from sysfs attributes, pixels from reading the device node:
//!
//! | sysfs attribute | Example | Used as |
//! |---|---|---|
//! | `mode` / `modes` | `U:1080x1920p-60` | visible width, height, refresh |
//! | `virtual_size` | `1080,3840` | width, height when no mode is listed |
//! | `bits_per_pixel` | `16` | format check (RGB565 only) |
//! | `stride` | `2176` | row length in **bytes** |
//! | `rotate` | `1` | quarter turns |
//!
//! `virtual_size` spans every page of a page-flipped framebuffer, so it is
//! only a fallback; a screenshot reads the first visible page.
//!
//! fbdev exposes no physical size, so the reported mode carries a fixed
//! 160 dpi and density 1.0. Refresh falls back to 60 fps when the mode
//! string has none.

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use minicap_core::{Orientation, PixelFormat, Status};
use tracing::{debug, warn};

use crate::compositor::{Compositor, DisplayConfig, DisplayHandle, Screenshot};

const DEFAULT_FPS: f32 = 60.0;
const DEFAULT_DPI: f32 = 160.0;

/// Framebuffer-backed [`Compositor`].
#[derive(Debug, Clone)]
pub struct FramebufferCompositor {
    sysfs_root: PathBuf,
    dev_root:   PathBuf,
}

impl Default for FramebufferCompositor {
    fn default() -> Self {
        Self::new("/sys/class/graphics", "/dev")
    }
}

/// Geometry read from sysfs.
#[derive(Debug, Clone, Copy, PartialEq)]
struct FbMode {
    width:          u32,
    height:         u32,
    fps:            f32,
    orientation:    Orientation,
    bits_per_pixel: u32,
    stride_bytes:   u32,
}

impl FramebufferCompositor {
    pub fn new(sysfs_root: impl Into<PathBuf>, dev_root: impl Into<PathBuf>) -> Self {
        Self { sysfs_root: sysfs_root.into(), dev_root: dev_root.into() }
    }

    fn sysfs_dir(&self, handle: &DisplayHandle) -> PathBuf {
        self.sysfs_root.join(format!("fb{}", handle.raw()))
    }

    fn read_mode(&self, handle: &DisplayHandle) -> Result<FbMode, Status> {
        let dir = self.sysfs_dir(handle);

        let (width, height, fps) = match visible_mode(&dir)? {
            Some(mode) => mode,
            None => {
                let size = read_attr(&dir, "virtual_size")?;
                let (w, h) = size.split_once(',').ok_or(Status::BAD_VALUE)?;
                debug!("fb{}: no mode listed, using virtual_size {}", handle.raw(), size);
                (parse_u32(w)?, parse_u32(h)?, DEFAULT_FPS)
            }
        };
        let bits_per_pixel = parse_u32(&read_attr(&dir, "bits_per_pixel")?)?;
        let stride_bytes = match optional_attr(&dir, "stride")? {
            Some(s) => parse_u32(&s)?,
            // Older kernels lack `stride`; assume packed rows.
            None => width * bits_per_pixel / 8,
        };
        let orientation = match optional_attr(&dir, "rotate")? {
            Some(s) => Orientation::from_quarter_turns((parse_u32(&s)? % 4) as u8),
            None => Orientation::Deg0,
        };

        Ok(FbMode { width, height, fps, orientation, bits_per_pixel, stride_bytes })
    }
}

impl Compositor for FramebufferCompositor {
    fn resolve_display_handle(&self, display_id: i32) -> Result<DisplayHandle, Status> {
        let index = u64::try_from(display_id).map_err(|_| Status::BAD_VALUE)?;
        let handle = DisplayHandle::new(index);
        if !self.sysfs_dir(&handle).is_dir() {
            return Err(Status::NAME_NOT_FOUND);
        }
        Ok(handle)
    }

    fn display_configs(&self, handle: &DisplayHandle) -> Result<Vec<DisplayConfig>, Status> {
        let mode = self.read_mode(handle)?;
        Ok(vec![DisplayConfig {
            width:       mode.width,
            height:      mode.height,
            orientation: mode.orientation,
            fps:         mode.fps,
            density:     1.0,
            xdpi:        DEFAULT_DPI,
            ydpi:        DEFAULT_DPI,
            secure:      false,
        }])
    }

    fn active_config(&self, _handle: &DisplayHandle) -> i32 {
        0
    }

    fn take_screenshot(&self, handle: &DisplayHandle) -> Result<Screenshot, Status> {
        let mode = self.read_mode(handle)?;
        let rgb565_bits = PixelFormat::Rgb565.bytes_per_pixel().map(|b| b * 8);
        if rgb565_bits != Some(mode.bits_per_pixel) {
            warn!("fb{}: {} bpp, only RGB565 is supported", handle.raw(), mode.bits_per_pixel);
            return Err(Status::BAD_TYPE);
        }

        let len = mode.stride_bytes as usize * mode.height as usize;
        let path = self.dev_root.join(format!("fb{}", handle.raw()));
        let mut pixels = vec![0u8; len];
        std::fs::File::open(&path)
            .and_then(|mut f| f.read_exact(&mut pixels))
            .map_err(|e| {
                warn!("reading {}: {}", path.display(), e);
                io_status(&e)
            })?;
        debug!("fb{}: read {} bytes", handle.raw(), len);

        Ok(Screenshot {
            pixels,
            width:  mode.width,
            height: mode.height,
            stride: mode.stride_bytes / 2,
            format: PixelFormat::Rgb565,
        })
    }
}

/// Visible `(width, height, fps)` from `mode`, else the first line of `modes`.
/// `None` when the driver lists neither.
fn visible_mode(dir: &Path) -> Result<Option<(u32, u32, f32)>, Status> {
    for name in ["mode", "modes"] {
        let Some(text) = optional_attr(dir, name)? else { continue };
        if let Some(line) = text.lines().map(str::trim).find(|l| !l.is_empty()) {
            return parse_mode(line).map(Some);
        }
    }
    Ok(None)
}

/// Parse a kernel mode string, `U:1080x1920p-60`. The refresh part is
/// optional.
fn parse_mode(line: &str) -> Result<(u32, u32, f32), Status> {
    let geometry = line.split_once(':').map_or(line, |(_, g)| g);
    let (res, refresh) = match geometry.split_once('-') {
        Some((res, refresh)) => (res, Some(refresh)),
        None => (geometry, None),
    };
    let (w, h) = res.split_once('x').ok_or(Status::BAD_VALUE)?;
    // Scan type suffix: p, i or d.
    let h = h.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    let fps = match refresh {
        Some(r) => r.trim().parse::<f32>().map_err(|_| Status::BAD_VALUE)?,
        None => DEFAULT_FPS,
    };
    Ok((parse_u32(w)?, parse_u32(h)?, fps))
}

/// Like [`read_attr`], but a missing attribute is `None`.
fn optional_attr(dir: &Path, name: &str) -> Result<Option<String>, Status> {
    match read_attr(dir, name) {
        Ok(s) => Ok(Some(s)),
        Err(Status::NAME_NOT_FOUND) => Ok(None),
        Err(status) => {
            warn!("reading {}/{}: {}", dir.display(), name, status);
            Err(status)
        }
    }
}

fn read_attr(dir: &Path, name: &str) -> Result<String, Status> {
    std::fs::read_to_string(dir.join(name))
        .map(|s| s.trim().to_owned())
        .map_err(|e| io_status(&e))
}

fn parse_u32(s: &str) -> Result<u32, Status> {
    s.trim().parse().map_err(|_| Status::BAD_VALUE)
}

fn io_status(e: &io::Error) -> Status {
    match e.kind() {
        io::ErrorKind::NotFound => Status::NAME_NOT_FOUND,
        io::ErrorKind::PermissionDenied => Status::PERMISSION_DENIED,
        io::ErrorKind::UnexpectedEof => Status::NOT_ENOUGH_DATA,
        _ => Status::UNKNOWN_ERROR,
    }
}
