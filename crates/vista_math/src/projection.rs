//! World ↔ screen transforms on the grid plane.
//!
//! The grid plane is world XY (z = 0), viewed orthographically around the
//! camera position. Screen coordinates are pixels with the origin at the
//! viewport's top-left corner and y growing downwards:
//!
//! ```text
//! screen.x = width  / 2 + (world.x - camera.x) * scale
//! screen.y = height / 2 - (world.y - camera.y) * scale
//! scale    = 50 / zoom
//! ```
//!
//! The reference grid, the overlay renderer, and cursor readouts all go
//! through these functions so their results stay numerically consistent.

use glam::{Vec2, Vec3};

use crate::camera::CameraState;
use crate::rect::Rect;

/// Pixels per world unit at zoom 1
pub const PIXELS_PER_UNIT: f32 = 50.0;

/// Smallest zoom used when deriving a scale
pub const MIN_SCALE_ZOOM: f32 = 1e-4;

/// Pixels per world unit for a camera zoom factor
#[inline]
pub fn grid_scale(zoom: f32) -> f32 {
    PIXELS_PER_UNIT / zoom.max(MIN_SCALE_ZOOM)
}

/// Project a world point onto the screen of a viewport of `viewport` size
pub fn world_to_screen(point: Vec3, camera: &CameraState, viewport: Vec2) -> Vec2 {
    let scale = grid_scale(camera.zoom);
    Vec2::new(
        viewport.x * 0.5 + (point.x - camera.position.x) * scale,
        viewport.y * 0.5 - (point.y - camera.position.y) * scale,
    )
}

/// Inverse of [`world_to_screen`]; the result lies on the grid plane (z = 0)
pub fn screen_to_world(screen: Vec2, camera: &CameraState, viewport: Vec2) -> Vec3 {
    let scale = grid_scale(camera.zoom);
    Vec3::new(
        camera.position.x + (screen.x - viewport.x * 0.5) / scale,
        camera.position.y - (screen.y - viewport.y * 0.5) / scale,
        0.0,
    )
}

/// World-space rectangle visible in a viewport, as `(min, max)` corners
pub fn visible_world_bounds(camera: &CameraState, viewport: Vec2) -> (Vec2, Vec2) {
    let scale = grid_scale(camera.zoom);
    let half = viewport * 0.5 / scale;
    let center = Vec2::new(camera.position.x, camera.position.y);
    (center - half, center + half)
}

/// Whether a screen point falls inside a viewport of `viewport` size
#[inline]
pub fn is_on_screen(point: Vec2, viewport: Vec2) -> bool {
    Rect::from_size(viewport).contains(point)
}
