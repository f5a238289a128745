use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::capture::sink::CaptureConfig;
use crate::foundation::core::{Canvas, Fps, parse_resolution};
use crate::foundation::error::{VjError, VjResult};

/// Audio format used when a capture does not say otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CaptureDefaults {
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for CaptureDefaults {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 2,
        }
    }
}

/// Session settings, loaded from JSON. Every field has a default.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Resolution label, e.g. `"1920x1080 (FHD)"`; only the leading `WxH` is read.
    pub resolution: String,
    pub fps: u32,
    pub seed: u64,
    /// Fallback for sources that never report a duration or never load.
    pub media_timeout_secs: f64,
    /// Let the text engine search installed system fonts.
    pub system_fonts: bool,
    /// Family name to font file.
    pub fonts: BTreeMap<String, PathBuf>,
    /// Root that relative media locators resolve against.
    pub media_root: PathBuf,
    pub capture: CaptureDefaults,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            resolution: "1920x1080 (FHD)".to_owned(),
            fps: 30,
            seed: 0x5eed,
            media_timeout_secs: 10.0,
            system_fonts: true,
            fonts: BTreeMap::new(),
            media_root: PathBuf::from("."),
            capture: CaptureDefaults::default(),
        }
    }
}

impl SessionConfig {
    pub fn from_json(text: &str) -> VjResult<Self> {
        let cfg: Self = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> VjResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read session config {}", path.display()))?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> VjResult<()> {
        if self.fps == 0 {
            return Err(VjError::validation("session fps must be > 0"));
        }
        if !(self.media_timeout_secs.is_finite() && self.media_timeout_secs > 0.0) {
            return Err(VjError::validation("media timeout must be a positive number"));
        }
        Ok(())
    }

    pub fn canvas(&self) -> Canvas {
        parse_resolution(&self.resolution)
    }

    pub fn frame_rate(&self) -> VjResult<Fps> {
        Fps::new(self.fps, 1)
    }

    /// Capture settings for the session canvas and frame rate.
    pub fn capture_config(&self) -> VjResult<CaptureConfig> {
        let canvas = self.canvas();
        Ok(CaptureConfig {
            width: canvas.width,
            height: canvas.height,
            fps: self.frame_rate()?,
            sample_rate: self.capture.sample_rate,
            channels: self.capture.channels,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/config.rs"]
mod tests;
