// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::CameraPosition;
use crate::constants::{DEFAULT_JPEG_QUALITY, DEFAULT_MAX_IMAGES, DEFAULT_SAVE_FOLDER};
use crate::errors::{AppError, AppResult};
use crate::flash::FlashMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directory name under the user config dir
const CONFIG_DIR_NAME: &str = "photo-capture";
/// Config file name inside `CONFIG_DIR_NAME`
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Image cap used when the caller does not pass one to `start`
    pub default_max_count: usize,
    /// Camera bound when a session starts
    pub initial_position: CameraPosition,
    /// Flash mode at session start
    pub default_flash_mode: FlashMode,
    /// Mirror front camera captures left-right
    pub mirror_front_captures: bool,
    /// JPEG quality (1-100) for saved hand-off images
    pub jpeg_quality: u8,
    /// Where the CLI writes handed-off images (None = pictures dir)
    pub output_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_max_count: DEFAULT_MAX_IMAGES,
            initial_position: CameraPosition::Back,
            default_flash_mode: FlashMode::Auto,
            mirror_front_captures: true,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            output_dir: None,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Read and validate a config file
    pub fn load(path: &Path) -> AppResult<Config> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Read the config at `path` (or the default location), falling back to defaults
    pub fn load_or_default(path: Option<&Path>) -> Config {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) => path,
                None => return Config::default(),
            },
        };

        if !path.exists() {
            return Config::default();
        }

        match Self::load(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Invalid config, using defaults");
                Config::default()
            }
        }
    }

    /// Write the config as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> AppResult<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Reject values no session can run with
    pub fn validate(&self) -> AppResult<()> {
        if self.default_max_count == 0 {
            return Err(AppError::Config(
                "default_max_count must be at least 1".to_string(),
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(AppError::Config(format!(
                "jpeg_quality must be within 1-100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }

    /// Directory hand-off images are written to
    pub fn resolved_output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| {
            dirs::picture_dir()
                .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
                .join(DEFAULT_SAVE_FOLDER)
        })
    }
}
