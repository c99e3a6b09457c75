//! Container partitioning for multi-viewport layouts.
//!
//! ```text
//!  Horizontal        Vertical        Grid2x2
//! ┌──┬──┬──┐       ┌────────┐      ┌────┬────┐
//! │ 1│ 2│ 3│       │   1    │      │ 1  │ 2  │
//! │  │  │  │       ├────────┤      ├────┼────┤
//! │  │  │  │       │   2    │      │ 3  │ 4  │
//! └──┴──┴──┘       └────────┘      └────┴────┘
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};
use vista_math::Rect;

/// Viewport arrangement inside the registry container
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Layout {
    /// First viewport fills the container
    #[default]
    Single,
    /// Equal columns
    Horizontal,
    /// Equal rows
    Vertical,
    Grid2x2,
    Grid3x3,
    /// Geometry owned by the caller; nothing is computed
    Custom,
}

impl Layout {
    /// Number of slots, `None` when unbounded or caller-owned
    pub fn capacity(&self) -> Option<usize> {
        match self {
            Self::Single => Some(1),
            Self::Grid2x2 => Some(4),
            Self::Grid3x3 => Some(9),
            Self::Horizontal | Self::Vertical | Self::Custom => None,
        }
    }

    /// Slot rectangle for each of `count` viewports in insertion order.
    ///
    /// `None` entries receive no slot and keep their current geometry.
    pub fn partition(&self, container: Vec2, count: usize) -> Vec<Option<Rect>> {
        let (w, h) = (container.x, container.y);
        (0..count)
            .map(|i| match self {
                Self::Single => (i == 0).then(|| Rect::new(0.0, 0.0, w, h)),
                Self::Horizontal => {
                    let cell = w / count as f32;
                    Some(Rect::new(cell * i as f32, 0.0, cell, h))
                }
                Self::Vertical => {
                    let cell = h / count as f32;
                    Some(Rect::new(0.0, cell * i as f32, w, cell))
                }
                Self::Grid2x2 => grid_cell(container, 2, i),
                Self::Grid3x3 => grid_cell(container, 3, i),
                Self::Custom => None,
            })
            .collect()
    }
}

/// Row-major cell `index` of an `n`×`n` grid
fn grid_cell(container: Vec2, n: usize, index: usize) -> Option<Rect> {
    if index >= n * n {
        return None;
    }
    let cell = container / n as f32;
    let (col, row) = (index % n, index / n);
    Some(Rect::new(
        cell.x * col as f32,
        cell.y * row as f32,
        cell.x,
        cell.y,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_fills_first_only() {
        let slots = Layout::Single.partition(Vec2::new(800.0, 600.0), 3);
        assert_eq!(slots[0], Some(Rect::new(0.0, 0.0, 800.0, 600.0)));
        assert_eq!(slots[1], None);
        assert_eq!(slots[2], None);
    }

    #[test]
    fn test_horizontal_split() {
        let slots = Layout::Horizontal.partition(Vec2::new(1000.0, 500.0), 2);
        assert_eq!(slots[0], Some(Rect::new(0.0, 0.0, 500.0, 500.0)));
        assert_eq!(slots[1], Some(Rect::new(500.0, 0.0, 500.0, 500.0)));
    }

    #[test]
    fn test_vertical_split() {
        let slots = Layout::Vertical.partition(Vec2::new(300.0, 900.0), 3);
        assert_eq!(slots[2], Some(Rect::new(0.0, 600.0, 300.0, 300.0)));
    }

    #[test]
    fn test_grid2x2_tiles_without_gaps() {
        let container = Vec2::new(1280.0, 720.0);
        let slots: Vec<Rect> = Layout::Grid2x2
            .partition(container, 4)
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        let total: f32 = slots.iter().map(|r| r.area()).sum();
        assert_eq!(total, container.x * container.y);
        for (i, a) in slots.iter().enumerate() {
            assert_eq!(a.size(), container / 2.0);
            for b in &slots[i + 1..] {
                assert!(!a.overlaps(b));
            }
        }
        assert_eq!(slots[3].position(), Vec2::new(640.0, 360.0));
    }

    #[test]
    fn test_grid_beyond_capacity_has_no_slot() {
        let slots = Layout::Grid2x2.partition(Vec2::new(100.0, 100.0), 5);
        assert!(slots[3].is_some());
        assert!(slots[4].is_none());

        let slots = Layout::Grid3x3.partition(Vec2::new(90.0, 90.0), 9);
        assert_eq!(slots[4], Some(Rect::new(30.0, 30.0, 30.0, 30.0)));
    }

    #[test]
    fn test_custom_computes_nothing() {
        assert!(Layout::Custom
            .partition(Vec2::new(10.0, 10.0), 2)
            .iter()
            .all(Option::is_none));
        assert_eq!(Layout::Custom.capacity(), None);
    }
}
