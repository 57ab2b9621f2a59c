// SPDX-License-Identifier: GPL-3.0-only

use crate::app::state::CaptureMode;
use crate::backends::camera::CameraBackendType;
use crate::constants::{APP_DIR_NAME, EncodingQuality};
use crate::errors::ConfigError;
use crate::pipelines::photo::EncodingFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Config file name inside the application's config directory
const CONFIG_FILE_NAME: &str = "config.json";

/// User settings, persisted as JSON
///
/// Missing fields fall back to their defaults, so older files keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera backend to use (V4L2 or test pattern)
    pub backend: CameraBackendType,
    /// Last selected camera device id
    pub last_device_id: Option<String>,
    /// Capture mode at startup
    pub default_mode: CaptureMode,
    /// Photo output format (JPEG or PNG)
    pub photo_format: EncodingFormat,
    /// JPEG quality preset
    pub photo_quality: EncodingQuality,
    /// Request an audio track in video mode
    pub record_audio: bool,
    /// Override for the gallery storage directory
    pub gallery_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: CameraBackendType::default(),
            last_device_id: None,
            default_mode: CaptureMode::Photo,
            photo_format: EncodingFormat::default(),
            photo_quality: EncodingQuality::default(),
            record_audio: true,
            gallery_dir: None,
        }
    }
}

/// Loads and saves [`Config`] at a fixed path
#[derive(Debug, Clone)]
pub struct ConfigHandler {
    path: PathBuf,
}

impl ConfigHandler {
    /// Handler for the user's config directory
    pub fn new() -> Result<Self, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::at(dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME)))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the config, falling back to defaults when no file exists yet
    pub fn load(&self) -> Result<Config, ConfigError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No config file, using defaults");
                return Ok(Config::default());
            }
            Err(e) => return Err(ConfigError::Read(e.to_string())),
        };

        serde_json::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write(e.to_string()))?;
        }
        let json =
            serde_json::to_string_pretty(config).map_err(|e| ConfigError::Write(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| ConfigError::Write(e.to_string()))?;

        info!(path = %self.path.display(), "Config saved");
        Ok(())
    }
}
