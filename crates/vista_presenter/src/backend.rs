//! Graphics context backends
//!
//! A surface holds an ordered list of backends and takes the first one that
//! hands out a context:
//!
//! ```text
//! HighPerformance ──(unavailable)──► Compatibility ──(unavailable)──► Error
//!        │                                 │
//!   (failed) ──► Error               (failed) ──► Error
//! ```
//!
//! `Ok(None)` means "not available here, try the next one"; `Err` means the
//! acquisition itself broke and the surface gives up.

use std::any::Any;
use std::fmt;

use futures_util::future::{self, BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use vista_core::Color;

use crate::error::SurfaceError;

/// Capability class of a graphics backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    /// Modern API (WebGPU/Vulkan/Metal/WebGL2 class)
    HighPerformance,
    /// Legacy API (WebGL1/GLES2 class)
    Compatibility,
    /// CPU rasterizer or headless target
    Software,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HighPerformance => write!(f, "high-performance"),
            Self::Compatibility => write!(f, "compatibility"),
            Self::Software => write!(f, "software"),
        }
    }
}

/// Parameters for a context acquisition
#[derive(Debug, Clone, PartialEq)]
pub struct ContextRequest {
    /// Backing buffer width in physical pixels
    pub width: u32,
    /// Backing buffer height in physical pixels
    pub height: u32,
    pub msaa_samples: u32,
    pub vsync: bool,
}

/// Hardware rendering context owned by a surface
pub trait GraphicsContext: Send {
    /// Backend that produced this context
    fn backend(&self) -> BackendKind;

    /// Re-target the backing buffer
    fn resize_buffer(&mut self, width: u32, height: u32);

    /// Current backing buffer size
    fn buffer_size(&self) -> (u32, u32);

    /// Clear the frame before the render callback runs
    fn clear(&mut self, color: Color);

    /// Downcast hook for draw pipelines that know the concrete context
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// One acquisition strategy
pub trait ContextBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn name(&self) -> &str;

    /// Try to create a context; `Ok(None)` when the backend is unavailable
    fn acquire<'a>(
        &'a self,
        request: &'a ContextRequest,
    ) -> BoxFuture<'a, Result<Option<Box<dyn GraphicsContext>>, SurfaceError>>;
}

/// Behaviour of a [`HeadlessBackend`]
#[derive(Debug, Clone, PartialEq)]
pub enum Availability {
    Available,
    Unavailable,
    /// Acquisition fails with the given message
    Failing(String),
}

/// Backend producing CPU-side [`HeadlessContext`]s.
///
/// Used when no GPU is present and to exercise the fallback chain.
#[derive(Debug, Clone)]
pub struct HeadlessBackend {
    kind: BackendKind,
    name: String,
    availability: Availability,
}

impl HeadlessBackend {
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            name: format!("headless-{}", kind),
            availability: Availability::Available,
        }
    }

    /// Software backend, always available
    pub fn software() -> Self {
        Self::new(BackendKind::Software)
    }

    pub fn with_availability(mut self, availability: Availability) -> Self {
        self.availability = availability;
        self
    }

    pub fn unavailable(kind: BackendKind) -> Self {
        Self::new(kind).with_availability(Availability::Unavailable)
    }

    pub fn failing(kind: BackendKind, message: impl Into<String>) -> Self {
        Self::new(kind).with_availability(Availability::Failing(message.into()))
    }
}

impl ContextBackend for HeadlessBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn acquire<'a>(
        &'a self,
        request: &'a ContextRequest,
    ) -> BoxFuture<'a, Result<Option<Box<dyn GraphicsContext>>, SurfaceError>> {
        let result = match &self.availability {
            Availability::Available => {
                let context: Box<dyn GraphicsContext> =
                    Box::new(HeadlessContext::new(self.kind, request.width, request.height));
                Ok(Some(context))
            }
            Availability::Unavailable => Ok(None),
            Availability::Failing(message) => Err(SurfaceError::AcquisitionFailed {
                backend: self.name.clone(),
                message: message.clone(),
            }),
        };
        future::ready(result).boxed()
    }
}

/// CPU-side context that records what the surface asked of it
#[derive(Debug, Clone)]
pub struct HeadlessContext {
    backend: BackendKind,
    width: u32,
    height: u32,
    clear_count: u64,
    last_clear: Option<Color>,
    resize_count: u32,
}

impl HeadlessContext {
    pub fn new(backend: BackendKind, width: u32, height: u32) -> Self {
        Self {
            backend,
            width,
            height,
            clear_count: 0,
            last_clear: None,
            resize_count: 0,
        }
    }

    pub fn clear_count(&self) -> u64 {
        self.clear_count
    }

    pub fn last_clear(&self) -> Option<Color> {
        self.last_clear
    }

    pub fn resize_count(&self) -> u32 {
        self.resize_count
    }
}

impl GraphicsContext for HeadlessContext {
    fn backend(&self) -> BackendKind {
        self.backend
    }

    fn resize_buffer(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.resize_count += 1;
    }

    fn buffer_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: Color) {
        self.clear_count += 1;
        self.last_clear = Some(color);
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
