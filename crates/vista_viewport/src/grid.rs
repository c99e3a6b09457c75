//! Reference grid and snapping.
//!
//! Lines are generated on the world XY plane for the region the camera can
//! see and returned in screen space, so hosts can draw them with any 2D
//! pipeline. Projection goes through [`vista_math::projection`].

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use vista_core::Color;
use vista_math::{
    is_on_screen, round_to_multiple, visible_world_bounds, world_to_screen, CameraState,
};

/// Upper bound on lines generated per direction
pub const MAX_GRID_LINES: usize = 2000;

/// Tolerance (in units of the major size) for classifying a line as major
pub const MAJOR_LINE_TOLERANCE: f32 = 1e-4;

/// Grid appearance
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// World spacing of major lines
    pub size: f32,
    /// Minor divisions per major cell
    pub subdivisions: u32,
    pub visible: bool,
    pub show_axes: bool,
    pub major_color: Color,
    pub minor_color: Color,
    pub x_axis_color: Color,
    pub y_axis_color: Color,
    pub opacity: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: 1.0,
            subdivisions: 10,
            visible: true,
            show_axes: true,
            major_color: Color::from_rgb8(0x55, 0x55, 0x55),
            minor_color: Color::from_rgb8(0x33, 0x33, 0x33),
            x_axis_color: Color::RED,
            y_axis_color: Color::GREEN,
            opacity: 1.0,
        }
    }
}

impl GridConfig {
    /// World distance between adjacent lines
    pub fn step(&self) -> f32 {
        self.size / self.subdivisions.max(1) as f32
    }
}

/// Snapping behaviour
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    pub grid_snap: bool,
    pub grid_snap_size: f32,
    pub angle_snap: bool,
    /// Degrees
    pub angle_snap_increment: f32,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            grid_snap: false,
            grid_snap_size: 0.5,
            angle_snap: false,
            angle_snap_increment: 15.0,
        }
    }
}

/// Direction of a grid line on screen
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineOrientation {
    /// Constant world x
    Vertical,
    /// Constant world y
    Horizontal,
}

/// One screen-space segment
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridLine {
    pub start: Vec2,
    pub end: Vec2,
    pub orientation: LineOrientation,
    /// World coordinate the line sits on
    pub value: f32,
    pub color: Color,
}

/// Lines for one frame, grouped by weight
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    pub major: Vec<GridLine>,
    pub minor: Vec<GridLine>,
    pub axes: Vec<GridLine>,
}

impl GridGeometry {
    pub fn is_empty(&self) -> bool {
        self.major.is_empty() && self.minor.is_empty() && self.axes.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.major.len() + self.minor.len() + self.axes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GridLine> {
        self.minor.iter().chain(&self.major).chain(&self.axes)
    }
}

/// Generate the grid lines visible to `camera` in a viewport of `viewport`
/// pixels
pub fn calculate_grid_lines(camera: &CameraState, viewport: Vec2, config: &GridConfig) -> GridGeometry {
    let mut geometry = GridGeometry::default();
    let step = config.step();
    if !config.visible || viewport.x <= 0.0 || viewport.y <= 0.0 || step <= 0.0 {
        return geometry;
    }

    let (min, max) = visible_world_bounds(camera, viewport);
    let major_color = config.major_color.with_opacity(config.opacity);
    let minor_color = config.minor_color.with_opacity(config.opacity);

    for orientation in [LineOrientation::Vertical, LineOrientation::Horizontal] {
        let (lo, hi) = match orientation {
            LineOrientation::Vertical => (min.x, max.x),
            LineOrientation::Horizontal => (min.y, max.y),
        };
        let first = (lo / step).ceil() as i64;
        let last = (hi / step).floor() as i64;
        if last < first {
            continue;
        }

        for index in (first..=last).take(MAX_GRID_LINES) {
            let value = index as f32 * step;
            let major = is_major(value, config.size);
            let color = if major { major_color } else { minor_color };
            let line = project_line(camera, viewport, orientation, value, min, max, color);

            if major {
                geometry.major.push(line);
            } else {
                geometry.minor.push(line);
            }
        }
    }

    if config.show_axes {
        let origin = world_to_screen(Vec3::ZERO, camera, viewport);
        // x-axis: world y = 0
        if (0.0..=viewport.y).contains(&origin.y) {
            geometry.axes.push(GridLine {
                start: Vec2::new(0.0, origin.y),
                end: Vec2::new(viewport.x, origin.y),
                orientation: LineOrientation::Horizontal,
                value: 0.0,
                color: config.x_axis_color.with_opacity(config.opacity),
            });
        }
        // y-axis: world x = 0
        if (0.0..=viewport.x).contains(&origin.x) {
            geometry.axes.push(GridLine {
                start: Vec2::new(origin.x, 0.0),
                end: Vec2::new(origin.x, viewport.y),
                orientation: LineOrientation::Vertical,
                value: 0.0,
                color: config.y_axis_color.with_opacity(config.opacity),
            });
        }
    }

    log::trace!(
        "Grid: {} major, {} minor, {} axes",
        geometry.major.len(),
        geometry.minor.len(),
        geometry.axes.len()
    );
    geometry
}

fn is_major(value: f32, size: f32) -> bool {
    if size <= 0.0 {
        return false;
    }
    let units = value / size;
    (units - units.round()).abs() < MAJOR_LINE_TOLERANCE
}

fn project_line(
    camera: &CameraState,
    viewport: Vec2,
    orientation: LineOrientation,
    value: f32,
    min: Vec2,
    max: Vec2,
    color: Color,
) -> GridLine {
    let (from, to) = match orientation {
        LineOrientation::Vertical => (Vec3::new(value, min.y, 0.0), Vec3::new(value, max.y, 0.0)),
        LineOrientation::Horizontal => (Vec3::new(min.x, value, 0.0), Vec3::new(max.x, value, 0.0)),
    };
    GridLine {
        start: world_to_screen(from, camera, viewport),
        end: world_to_screen(to, camera, viewport),
        orientation,
        value,
        color,
    }
}

/// Round each coordinate to the nearest multiple of the snap size
pub fn snap_to_grid(point: Vec3, snap: &SnapConfig) -> Vec3 {
    if !snap.grid_snap || snap.grid_snap_size <= 0.0 {
        return point;
    }
    let size = snap.grid_snap_size;
    Vec3::new(
        round_to_multiple(point.x, size),
        round_to_multiple(point.y, size),
        round_to_multiple(point.z, size),
    )
}

/// Round an angle in degrees to the nearest snap increment
pub fn snap_angle(angle: f32, snap: &SnapConfig) -> f32 {
    if !snap.angle_snap {
        return angle;
    }
    round_to_multiple(angle, snap.angle_snap_increment)
}

/// Level of detail for a zoom factor; 3 means major lines only
pub fn grid_lod(zoom: f32) -> u8 {
    match zoom {
        z if z < 2.0 => 0,
        z if z < 8.0 => 1,
        z if z < 32.0 => 2,
        _ => 3,
    }
}

/// Whether a world point lands inside the viewport
pub fn is_point_visible(point: Vec3, camera: &CameraState, viewport: Vec2) -> bool {
    is_on_screen(world_to_screen(point, camera, viewport), viewport)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(x: f32, y: f32, zoom: f32) -> CameraState {
        CameraState {
            zoom,
            ..CameraState::orthographic(Vec3::new(x, y, 0.0), 10.0)
        }
    }

    #[test]
    fn test_lines_cover_visible_range() {
        // 500x500 at zoom 1 shows 10x10 world units around the origin
        let config = GridConfig {
            subdivisions: 4,
            ..Default::default()
        };
        let geometry = calculate_grid_lines(&camera(0.0, 0.0, 1.0), Vec2::new(500.0, 500.0), &config);

        // -5..=5 in steps of 0.25 per direction
        assert_eq!(geometry.major.len() + geometry.minor.len(), 2 * 41);
        assert_eq!(geometry.major.len(), 2 * 11);
        assert_eq!(geometry.axes.len(), 2);
    }

    #[test]
    fn test_major_lines_land_on_size_multiples() {
        let config = GridConfig {
            size: 2.0,
            subdivisions: 4,
            ..Default::default()
        };
        let geometry = calculate_grid_lines(&camera(0.3, -0.7, 1.0), Vec2::new(400.0, 300.0), &config);

        assert!(!geometry.major.is_empty());
        for line in &geometry.major {
            let units = line.value / config.size;
            assert!((units - units.round()).abs() < MAJOR_LINE_TOLERANCE);
        }
        for line in &geometry.minor {
            let units = line.value / config.size;
            assert!((units - units.round()).abs() >= MAJOR_LINE_TOLERANCE);
        }
    }

    #[test]
    fn test_vertical_lines_span_viewport() {
        let viewport = Vec2::new(200.0, 100.0);
        let config = GridConfig {
            subdivisions: 4,
            ..Default::default()
        };
        let geometry = calculate_grid_lines(&camera(0.0, 0.0, 1.0), viewport, &config);
        let line = geometry
            .major
            .iter()
            .find(|l| l.orientation == LineOrientation::Vertical && l.value == 1.0)
            .unwrap();

        assert!((line.start.x - 150.0).abs() < 1e-3);
        assert!((line.start.y - 100.0).abs() < 1e-3);
        assert!(line.end.y.abs() < 1e-3);
    }

    #[test]
    fn test_axes_omitted_when_off_screen() {
        let geometry = calculate_grid_lines(
            &camera(100.0, 0.0, 1.0),
            Vec2::new(500.0, 500.0),
            &GridConfig::default(),
        );
        assert_eq!(geometry.axes.len(), 1);
        assert_eq!(geometry.axes[0].orientation, LineOrientation::Horizontal);
    }

    #[test]
    fn test_empty_for_hidden_or_zero_area() {
        let cam = camera(0.0, 0.0, 1.0);
        let hidden = GridConfig {
            visible: false,
            ..Default::default()
        };
        assert!(calculate_grid_lines(&cam, Vec2::new(500.0, 500.0), &hidden).is_empty());
        assert!(calculate_grid_lines(&cam, Vec2::new(0.0, 500.0), &GridConfig::default()).is_empty());
    }

    #[test]
    fn test_line_count_is_capped() {
        let geometry = calculate_grid_lines(
            &camera(0.0, 0.0, 1000.0),
            Vec2::new(1920.0, 1080.0),
            &GridConfig::default(),
        );
        assert!(geometry.major.len() + geometry.minor.len() <= 2 * MAX_GRID_LINES);
    }

    #[test]
    fn test_snap_to_grid() {
        let snap = SnapConfig {
            grid_snap: true,
            ..Default::default()
        };
        let snapped = snap_to_grid(Vec3::new(0.74, -1.3, 2.26), &snap);
        assert_eq!(snapped, Vec3::new(0.5, -1.5, 2.5));
        assert_eq!(snap_to_grid(snapped, &snap), snapped);

        let point = Vec3::new(0.74, 0.0, 0.0);
        assert_eq!(snap_to_grid(point, &SnapConfig::default()), point);
        let zero = SnapConfig {
            grid_snap: true,
            grid_snap_size: 0.0,
            ..Default::default()
        };
        assert_eq!(snap_to_grid(point, &zero), point);
    }

    #[test]
    fn test_snap_angle() {
        let snap = SnapConfig {
            angle_snap: true,
            ..Default::default()
        };
        assert_eq!(snap_angle(22.0, &snap), 15.0);
        assert_eq!(snap_angle(23.0, &snap), 30.0);
        assert_eq!(snap_angle(23.0, &SnapConfig::default()), 23.0);
    }

    #[test]
    fn test_grid_lod_thresholds() {
        assert_eq!(grid_lod(1.0), 0);
        assert_eq!(grid_lod(2.0), 1);
        assert_eq!(grid_lod(7.9), 1);
        assert_eq!(grid_lod(8.0), 2);
        assert_eq!(grid_lod(32.0), 3);
    }

    #[test]
    fn test_point_visibility() {
        let cam = camera(0.0, 0.0, 1.0);
        let viewport = Vec2::new(500.0, 500.0);
        assert!(is_point_visible(Vec3::new(4.0, 4.0, 0.0), &cam, viewport));
        assert!(!is_point_visible(Vec3::new(6.0, 0.0, 0.0), &cam, viewport));
    }
}
