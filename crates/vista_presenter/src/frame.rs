//! Per-frame render context
//!
//! A [`FrameContext`] is built by the surface for exactly one callback
//! invocation and borrows the surface's graphics context and statistics.

use vista_core::SurfaceId;

use crate::backend::{BackendKind, GraphicsContext};
use crate::error::RenderError;
use crate::stats::RenderStatistics;

/// Identity of the surface producing a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceInfo {
    pub id: SurfaceId,
    pub backend: BackendKind,
    pub pixel_ratio: f32,
}

/// Everything a render callback may touch during one frame
pub struct FrameContext<'a> {
    pub surface: SurfaceInfo,
    pub context: &'a mut dyn GraphicsContext,
    /// Logical width
    pub width: u32,
    /// Logical height
    pub height: u32,
    /// Milliseconds since the previous frame (0 on the first)
    pub delta_time: f64,
    /// Frame timestamp (ms)
    pub timestamp: f64,
    /// 1-based frame number
    pub frame_count: u64,
    /// Counters the draw pipeline fills in
    pub stats: &'a mut RenderStatistics,
}

impl<'a> FrameContext<'a> {
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Delta time in seconds
    pub fn delta_seconds(&self) -> f64 {
        self.delta_time / 1000.0
    }

    /// Record one draw call
    pub fn record_draw(&mut self, vertices: u64, triangles: u64) {
        self.stats.draw_calls += 1;
        self.stats.vertices += vertices;
        self.stats.triangles += triangles;
        self.stats.rendered_objects += 1;
    }

    /// Record objects rejected before drawing
    pub fn record_culled(&mut self, count: u32) {
        self.stats.culled_objects += count;
    }
}

impl std::fmt::Debug for FrameContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameContext")
            .field("surface", &self.surface)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("delta_time", &self.delta_time)
            .field("timestamp", &self.timestamp)
            .field("frame_count", &self.frame_count)
            .finish()
    }
}

/// Externally supplied per-frame draw function
pub type RenderCallback = Box<dyn FnMut(&mut FrameContext<'_>) -> Result<(), RenderError> + Send>;
