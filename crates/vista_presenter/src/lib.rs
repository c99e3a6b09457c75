//! # vista_presenter - Render Surfaces
//!
//! Surface layer of the Vista viewport stack providing:
//! - Hardware context acquisition with ordered backend fallback
//! - A per-surface frame loop with optional frame-rate cap
//! - Frame timing and sampled render statistics
//! - Raw input republishing for camera controllers
//!
//! ## Architecture
//!
//! ```text
//! Host redraw ──► HostScheduler ──► RenderSurface::tick ──► render callback
//!                                         │
//!                                         ▼
//!                               GraphicsContext (backend)
//! ```
//!
//! ## Key Concepts
//!
//! - **FrameScheduler**: "run on next frame / after delay / cancel"
//! - **ContextBackend**: one acquisition strategy; `Ok(None)` falls through
//! - **RenderSurface**: state machine owning the context and the loop
//! - **FrameContext**: borrowed view handed to the callback for one frame

pub mod backend;
pub mod error;
pub mod frame;
pub mod input;
pub mod scheduler;
pub mod stats;
pub mod surface;
pub mod timing;

pub use backend::{
    Availability, BackendKind, ContextBackend, ContextRequest, GraphicsContext, HeadlessBackend,
    HeadlessContext,
};
pub use error::{RenderError, SurfaceError};
pub use frame::{FrameContext, RenderCallback, SurfaceInfo};
pub use input::{InputEvent, Modifiers, PointerButton, PointerEvent, TouchPoint, WheelEvent};
pub use scheduler::{FrameScheduler, FrameTask, HostScheduler, TaskHandle};
pub use stats::{is_sample_frame, RenderStatistics, STATS_SAMPLE_INTERVAL};
pub use surface::{RenderSurface, SurfaceConfig, SurfaceEvent, SurfaceState};
pub use timing::{frame_delay, FrameTiming};

/// Prelude
pub mod prelude {
    pub use crate::backend::{BackendKind, ContextBackend, GraphicsContext, HeadlessBackend};
    pub use crate::error::{RenderError, SurfaceError};
    pub use crate::frame::FrameContext;
    pub use crate::input::{InputEvent, Modifiers, PointerButton, PointerEvent, WheelEvent};
    pub use crate::scheduler::{FrameScheduler, HostScheduler};
    pub use crate::stats::RenderStatistics;
    pub use crate::surface::{RenderSurface, SurfaceConfig, SurfaceEvent, SurfaceState};
}
