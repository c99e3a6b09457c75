//! Render statistics
//!
//! Counts are filled in by the external draw pipeline through the frame
//! context; timing fields are filled by the surface from its own frame clock.
//! Surfaces publish a copy every [`STATS_SAMPLE_INTERVAL`] frames.

use serde::{Deserialize, Serialize};

/// Frames between two statistics samples
pub const STATS_SAMPLE_INTERVAL: u64 = 60;

/// Frame rendering statistics
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderStatistics {
    // === Timing ===
    /// Frames per second, averaged over recent frames
    pub fps: f32,
    /// Average frame time (ms)
    pub frame_time: f32,
    /// CPU time spent in the render callback (ms)
    pub cpu_time: f32,
    /// GPU time if the pipeline measures it (ms)
    pub gpu_time: f32,

    // === Counts ===
    /// Draw calls issued
    pub draw_calls: u32,
    /// Vertices processed
    pub vertices: u64,
    /// Triangles rendered
    pub triangles: u64,
    /// Objects culled (frustum, occlusion, LOD)
    pub culled_objects: u32,
    /// Objects rendered
    pub rendered_objects: u32,

    // === Memory ===
    /// Estimated GPU memory usage (bytes)
    pub gpu_memory: u64,
}

impl RenderStatistics {
    /// Create new empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of objects culled this frame (0.0 - 1.0)
    pub fn cull_ratio(&self) -> f32 {
        let total = u64::from(self.culled_objects) + u64::from(self.rendered_objects);
        if total == 0 {
            0.0
        } else {
            self.culled_objects as f32 / total as f32
        }
    }

    /// GPU memory in megabytes
    pub fn gpu_memory_mb(&self) -> f32 {
        self.gpu_memory as f32 / (1024.0 * 1024.0)
    }

    /// Reset the per-frame counters, keeping timing and memory
    pub fn reset_counts(&mut self) {
        self.draw_calls = 0;
        self.vertices = 0;
        self.triangles = 0;
        self.culled_objects = 0;
        self.rendered_objects = 0;
    }
}

/// Whether frame `frame_count` is a sampling frame
#[inline]
pub fn is_sample_frame(frame_count: u64) -> bool {
    frame_count > 0 && frame_count % STATS_SAMPLE_INTERVAL == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cull_ratio() {
        let stats = RenderStatistics {
            culled_objects: 25,
            rendered_objects: 75,
            ..Default::default()
        };
        assert_eq!(stats.cull_ratio(), 0.25);
        assert_eq!(RenderStatistics::new().cull_ratio(), 0.0);
    }

    #[test]
    fn test_cull_ratio_large_counts() {
        let stats = RenderStatistics {
            culled_objects: u32::MAX,
            rendered_objects: u32::MAX,
            ..Default::default()
        };
        assert_eq!(stats.cull_ratio(), 0.5);
    }

    #[test]
    fn test_sample_frames() {
        assert!(!is_sample_frame(0));
        assert!(!is_sample_frame(59));
        assert!(is_sample_frame(60));
        assert!(is_sample_frame(120));
    }

    #[test]
    fn test_reset_counts_keeps_memory() {
        let mut stats = RenderStatistics {
            draw_calls: 10,
            triangles: 300,
            gpu_memory: 2 * 1024 * 1024,
            ..Default::default()
        };
        stats.reset_counts();
        assert_eq!(stats.draw_calls, 0);
        assert_eq!(stats.triangles, 0);
        assert_eq!(stats.gpu_memory_mb(), 2.0);
    }
}
