//! Viewport error types

use std::path::PathBuf;

use thiserror::Error;
use vista_core::ViewportId;

/// Errors from registry snapshot import/export
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Snapshot (de)serialization failed: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("Snapshot contains {0} more than once")]
    DuplicateViewport(ViewportId),
}

/// Errors loading or saving viewer settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings I/O failed for {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Settings serialization failed: {0}")]
    Serialize(#[from] toml::ser::Error),
}
