use serde::{Deserialize, Serialize};

// MARK: - Orientation

/// Display rotation relative to its natural orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    #[serde(rename = "0")]
    Deg0,
    #[serde(rename = "90")]
    Deg90,
    #[serde(rename = "180")]
    Deg180,
    #[serde(rename = "270")]
    Deg270,
}

impl Orientation {
    /// Maps the compositor's quarter-turn index (0..=3). Out-of-range
    /// values wrap, matching how the rotation is applied.
    pub fn from_quarter_turns(turns: u8) -> Self {
        match turns % 4 {
            0 => Self::Deg0,
            1 => Self::Deg90,
            2 => Self::Deg180,
            _ => Self::Deg270,
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }
}

// MARK: - DisplayInfo

/// One display mode as reported by the compositor, plus the derived
/// diagonal size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplayInfo {
    pub width: u32,
    pub height: u32,
    pub orientation: Orientation,
    pub fps: f32,
    pub density: f32,
    pub xdpi: f32,
    pub ydpi: f32,
    /// Content must not be handed to untrusted consumers.
    pub secure: bool,
    /// Diagonal in inches.
    pub size: f32,
}

impl DisplayInfo {
    /// Geometry-only info, used to tell a session the desired output size.
    pub fn desired(width: u32, height: u32) -> Self {
        Self { width, height, ..Default::default() }
    }

    /// `sqrt((w / xdpi)^2 + (h / ydpi)^2)`
    pub fn diagonal_inches(width: u32, height: u32, xdpi: f32, ydpi: f32) -> f32 {
        let w = width as f32 / xdpi;
        let h = height as f32 / ydpi;
        (w * w + h * h).sqrt()
    }
}

// MARK: - PixelFormat

/// Pixel layout tag shared by compositor screenshots and delivered frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    None,
    Custom,
    Translucent,
    Transparent,
    Opaque,
    Rgba8888,
    Rgbx8888,
    Rgb888,
    Rgb565,
    Bgra8888,
    Rgba5551,
    Rgba4444,
    Unknown,
}

impl PixelFormat {
    /// Bytes per pixel, `None` for the symbolic/abstract formats.
    pub const fn bytes_per_pixel(self) -> Option<u32> {
        match self {
            Self::Rgba8888 | Self::Rgbx8888 | Self::Bgra8888 => Some(4),
            Self::Rgb888 => Some(3),
            Self::Rgb565 | Self::Rgba5551 | Self::Rgba4444 => Some(2),
            _ => None,
        }
    }
}

// MARK: - CaptureMethod

/// How a capturer obtains pixels from the compositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMethod {
    Framebuffer,
    Screenshot,
    VirtualDisplay,
}

impl std::fmt::Display for CaptureMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Framebuffer => write!(f, "framebuffer"),
            Self::Screenshot => write!(f, "screenshot"),
            Self::VirtualDisplay => write!(f, "virtual display"),
        }
    }
}
