//! Spherical coordinates (Y-up) for orbiting around a target

use glam::Vec3;

use crate::consts::PI;

/// Polar margin that keeps orbiting away from the poles
pub const POLE_EPSILON: f32 = 0.01;

/// Spherical coordinates of an offset vector.
///
/// `theta` is the azimuth around +Y measured from +Z towards +X,
/// `phi` the polar angle from +Y.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,
}

impl Spherical {
    pub const fn new(radius: f32, theta: f32, phi: f32) -> Self {
        Self { radius, theta, phi }
    }

    /// Convert an offset vector to spherical coordinates
    pub fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self::new(0.0, 0.0, 0.0);
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    /// Convert back to a Cartesian offset
    pub fn to_offset(&self) -> Vec3 {
        let sin_phi = self.phi.sin();
        Vec3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }

    /// Clamp `phi` to `[epsilon, PI - epsilon]`
    pub fn clamp_phi(mut self, epsilon: f32) -> Self {
        self.phi = self.phi.clamp(epsilon, PI - epsilon);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for offset in [
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::new(3.0, 4.0, -2.0),
            Vec3::new(-1.0, -7.5, 0.25),
        ] {
            let back = Spherical::from_offset(offset).to_offset();
            assert!((back - offset).length() < 1e-4, "{offset:?} -> {back:?}");
        }
    }

    #[test]
    fn test_axes() {
        let s = Spherical::from_offset(Vec3::new(0.0, 0.0, 5.0));
        assert!((s.theta).abs() < 1e-6);
        assert!((s.phi - PI / 2.0).abs() < 1e-6);
        assert_eq!(s.radius, 5.0);
    }

    #[test]
    fn test_clamp_phi() {
        let s = Spherical::new(1.0, 0.0, -3.0).clamp_phi(POLE_EPSILON);
        assert_eq!(s.phi, POLE_EPSILON);
        let s = Spherical::new(1.0, 0.0, 9.0).clamp_phi(POLE_EPSILON);
        assert_eq!(s.phi, PI - POLE_EPSILON);
    }
}
