//! Read-out panels.
//!
//! Stateless formatters turning statistics and cursor positions into
//! label/value rows. Hosts lay the rows out as a two-column grid.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use vista_presenter::RenderStatistics;

/// One `label: value` line
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelRow {
    pub label: String,
    pub value: String,
}

impl PanelRow {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Frame rate and frame time
pub fn fps_panel(stats: &RenderStatistics) -> Vec<PanelRow> {
    vec![
        PanelRow::new("FPS", format!("{:.1}", stats.fps)),
        PanelRow::new("Frame Time", format!("{:.2} ms", stats.frame_time)),
    ]
}

/// Full statistics breakdown
pub fn stats_panel(stats: &RenderStatistics) -> Vec<PanelRow> {
    let mut rows = fps_panel(stats);
    rows.extend([
        PanelRow::new("CPU Time", format!("{:.2} ms", stats.cpu_time)),
        PanelRow::new("GPU Time", format!("{:.2} ms", stats.gpu_time)),
        PanelRow::new("Draw Calls", stats.draw_calls.to_string()),
        PanelRow::new("Vertices", stats.vertices.to_string()),
        PanelRow::new("Triangles", stats.triangles.to_string()),
        PanelRow::new("Rendered", stats.rendered_objects.to_string()),
        PanelRow::new(
            "Culled",
            format!("{} ({:.0}%)", stats.culled_objects, stats.cull_ratio() * 100.0),
        ),
        PanelRow::new("GPU Memory", format!("{:.1} MB", stats.gpu_memory_mb())),
    ]);
    rows
}

/// Cursor world position, plus the snapped position when snapping is active
pub fn coordinate_panel(cursor: Vec3, snapped: Option<Vec3>) -> Vec<PanelRow> {
    let mut rows = vec![
        PanelRow::new("X", format!("{:.3}", cursor.x)),
        PanelRow::new("Y", format!("{:.3}", cursor.y)),
        PanelRow::new("Z", format!("{:.3}", cursor.z)),
    ];
    if let Some(snapped) = snapped {
        rows.push(PanelRow::new(
            "Snapped",
            format!("{:.3}, {:.3}, {:.3}", snapped.x, snapped.y, snapped.z),
        ));
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps_panel() {
        let stats = RenderStatistics {
            fps: 59.94,
            frame_time: 16.683,
            ..Default::default()
        };
        assert_eq!(
            fps_panel(&stats),
            vec![PanelRow::new("FPS", "59.9"), PanelRow::new("Frame Time", "16.68 ms")]
        );
    }

    #[test]
    fn test_stats_panel_lists_counts() {
        let stats = RenderStatistics {
            draw_calls: 12,
            triangles: 3400,
            ..Default::default()
        };
        let rows = stats_panel(&stats);
        assert_eq!(rows.len(), 10);
        assert!(rows.contains(&PanelRow::new("Draw Calls", "12")));
        assert!(rows.contains(&PanelRow::new("Triangles", "3400")));
    }

    #[test]
    fn test_coordinate_panel() {
        let rows = coordinate_panel(Vec3::new(1.23456, -2.0, 0.0), None);
        assert_eq!(rows[0], PanelRow::new("X", "1.235"));
        assert_eq!(rows.len(), 3);

        let rows = coordinate_panel(Vec3::new(1.2, 0.0, 0.0), Some(Vec3::new(1.0, 0.0, 0.0)));
        assert_eq!(rows[3], PanelRow::new("Snapped", "1.000, 0.000, 0.000"));
    }
}
