//! Surface and render errors

use thiserror::Error;

use crate::surface::SurfaceState;

/// Errors raised by the external render callback
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RenderError {
    #[error("Draw pipeline failed: {0}")]
    Pipeline(String),

    #[error("Context lost")]
    ContextLost,

    #[error("{0}")]
    Message(String),
}

impl From<&str> for RenderError {
    fn from(s: &str) -> Self {
        RenderError::Message(s.to_string())
    }
}

impl From<String> for RenderError {
    fn from(s: String) -> Self {
        RenderError::Message(s)
    }
}

/// Surface errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SurfaceError {
    #[error("No rendering backend available (tried: {0})")]
    NoBackendAvailable(String),

    #[error("Context acquisition failed on {backend}: {message}")]
    AcquisitionFailed { backend: String, message: String },

    #[error("Surface is {actual:?}, expected {expected}")]
    InvalidState {
        actual: SurfaceState,
        expected: &'static str,
    },

    #[error("Surface was disposed during initialization")]
    Disposed,

    #[error("Render callback failed on frame {frame}: {source}")]
    Callback { frame: u64, source: RenderError },
}
