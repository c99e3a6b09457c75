//! Persistent viewer settings.
//!
//! Stored as TOML under the platform config directory:
//!
//! ```toml
//! layout = "grid2x2"
//! show_stats = true
//!
//! [viewport]
//! width = 1280
//! height = 720
//!
//! [controls]
//! pan_speed = 0.002
//! invert_y = true
//!
//! [snap]
//! grid_snap = true
//! ```
//!
//! Missing tables and fields take their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::ViewportConfig;
use crate::controller::ControlsConfig;
use crate::error::SettingsError;
use crate::grid::{GridConfig, SnapConfig};
use crate::layout::Layout;

/// Directory name under the platform config dir
pub const SETTINGS_DIR: &str = "vista";
pub const SETTINGS_FILE: &str = "settings.toml";

/// Everything a viewer restores on startup
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub layout: Layout,
    pub show_stats: bool,
    /// Defaults for newly added viewports
    pub viewport: ViewportConfig,
    pub controls: ControlsConfig,
    pub grid: GridConfig,
    pub snap: SnapConfig,
}

impl ViewerSettings {
    /// `<config dir>/vista/settings.toml`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(SETTINGS_DIR).join(SETTINGS_FILE))
    }

    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml(&content)?;
        log::info!("Loaded viewer settings from {}", path.display());
        Ok(settings)
    }

    /// Load from `path`, falling back to defaults when the file is missing
    /// or unreadable
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No settings at {}, using defaults", path.display());
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            log::warn!("{e}; using default settings");
            Self::default()
        })
    }

    /// Write to `path`, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        let io_error = |source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        fs::write(path, self.to_toml()?).map_err(io_error)?;
        log::info!("Saved viewer settings to {}", path.display());
        Ok(())
    }
}
