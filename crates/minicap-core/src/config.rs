use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Capture configuration for one display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    #[serde(alias = "displayId")]
    pub display_id: i32,
    /// Desired output width; 0 keeps the native width. Advisory only.
    #[serde(alias = "desiredWidth")]
    pub desired_width: u32,
    #[serde(alias = "desiredHeight")]
    pub desired_height: u32,
    /// Stop after this many frames. `None` runs until interrupted.
    #[serde(alias = "maxFrames")]
    pub max_frames: Option<u64>,
    /// Raw RGB888 dump target.
    pub output: Option<PathBuf>,
    #[serde(alias = "sysfsRoot")]
    pub sysfs_root: PathBuf,
    #[serde(alias = "devRoot")]
    pub dev_root: PathBuf,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            display_id: 0,
            desired_width: 0,
            desired_height: 0,
            max_frames: None,
            output: None,
            sysfs_root: PathBuf::from("/sys/class/graphics"),
            dev_root: PathBuf::from("/dev"),
        }
    }
}

impl CaptureConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Apply `MINICAP_*` overrides. `lookup` is `std::env::var` in the app.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("MINICAP_DISPLAY_ID") {
            match v.trim().parse() {
                Ok(id) => self.display_id = id,
                Err(_) => warn!("Ignoring MINICAP_DISPLAY_ID={:?}: not an integer", v),
            }
        }
        if let Some(v) = lookup("MINICAP_MAX_FRAMES") {
            match v.trim().parse() {
                Ok(n) => self.max_frames = Some(n),
                Err(_) => warn!("Ignoring MINICAP_MAX_FRAMES={:?}: not an integer", v),
            }
        }
        if let Some(v) = lookup("MINICAP_OUTPUT") {
            self.output = (!v.is_empty()).then(|| PathBuf::from(v));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CaptureConfig;
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[test]
    fn deserializes_camel_case_fields() {
        let json = r#"{
            "displayId": 1,
            "desiredWidth": 540,
            "desiredHeight": 960,
            "maxFrames": 30
        }"#;

        let cfg = CaptureConfig::from_json(json).expect("valid camelCase config");
        assert_eq!(cfg.display_id, 1);
        assert_eq!(cfg.desired_width, 540);
        assert_eq!(cfg.desired_height, 960);
        assert_eq!(cfg.max_frames, Some(30));
        assert_eq!(cfg.dev_root, PathBuf::from("/dev"));
    }

    #[test]
    fn deserializes_snake_case_fields() {
        let json = r#"{
            "display_id": 2,
            "output": "/tmp/frames.rgb",
            "sysfs_root": "/tmp/sys"
        }"#;

        let cfg = CaptureConfig::from_json(json).expect("valid snake_case config");
        assert_eq!(cfg.display_id, 2);
        assert_eq!(cfg.output, Some(PathBuf::from("/tmp/frames.rgb")));
        assert_eq!(cfg.sysfs_root, PathBuf::from("/tmp/sys"));
        assert_eq!(cfg.max_frames, None);
    }

    #[test]
    fn env_overrides_and_ignores_garbage() {
        let env: HashMap<&str, &str> = [
            ("MINICAP_DISPLAY_ID", "3"),
            ("MINICAP_MAX_FRAMES", "lots"),
            ("MINICAP_OUTPUT", "out.rgb"),
        ]
        .into_iter()
        .collect();

        let mut cfg = CaptureConfig { max_frames: Some(5), ..Default::default() };
        cfg.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.display_id, 3);
        assert_eq!(cfg.max_frames, Some(5));
        assert_eq!(cfg.output, Some(PathBuf::from("out.rgb")));
    }
}
