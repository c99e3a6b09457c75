//! # vista_math - Camera and Projection Math
//!
//! Pure functions and value types shared by the registry, the camera
//! controller, the reference grid, and the overlay renderer:
//! - Camera state and shallow-merge patches
//! - World ↔ screen transforms for the grid plane
//! - Spherical coordinates for orbiting
//! - Axis-aligned screen rectangles for layout

pub mod camera;
pub mod projection;
pub mod spherical;
pub mod rect;

pub use camera::*;
pub use projection::*;
pub use spherical::*;
pub use rect::*;

pub use glam::{Mat4, Quat, Vec2, Vec3};

/// Common math constants
pub mod consts {
    pub const PI: f32 = core::f32::consts::PI;
    pub const DEG_TO_RAD: f32 = PI / 180.0;
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
    /// Shortest forward vector considered non-degenerate
    pub const DEGENERATE_LENGTH: f32 = 1e-6;
}

/// Convert degrees to radians
#[inline]
pub fn radians(degrees: f32) -> f32 {
    degrees * consts::DEG_TO_RAD
}

/// Convert radians to degrees
#[inline]
pub fn degrees(radians: f32) -> f32 {
    radians * consts::RAD_TO_DEG
}

/// Round `value` to the nearest multiple of `step`; identity for non-positive steps
#[inline]
pub fn round_to_multiple(value: f32, step: f32) -> f32 {
    if step > 0.0 {
        (value / step).round() * step
    } else {
        value
    }
}

pub mod prelude {
    pub use crate::camera::{CameraMode, CameraState, CameraPatch};
    pub use crate::projection::{world_to_screen, screen_to_world, grid_scale};
    pub use crate::spherical::Spherical;
    pub use crate::rect::Rect;
    pub use crate::{radians, degrees, round_to_multiple};
    pub use glam::{Vec2, Vec3};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_multiple() {
        assert_eq!(round_to_multiple(0.74, 0.5), 0.5);
        assert_eq!(round_to_multiple(0.76, 0.5), 1.0);
        assert_eq!(round_to_multiple(-1.3, 1.0), -1.0);
        assert_eq!(round_to_multiple(3.3, 0.0), 3.3);
    }

    #[test]
    fn test_degree_conversion() {
        assert!((radians(180.0) - consts::PI).abs() < 1e-6);
        assert!((degrees(consts::PI / 2.0) - 90.0).abs() < 1e-4);
    }
}
