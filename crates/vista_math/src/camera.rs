//! Camera state and shallow-merge patches

use glam::{Mat4, Vec3};
use serde::{Deserialize, Deserializer, Serialize};

use crate::consts::DEGENERATE_LENGTH;

/// Projection mode of a viewport camera
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraMode {
    Orthographic,
    #[default]
    Perspective,
    Isometric,
}

impl CameraMode {
    pub fn is_perspective(&self) -> bool {
        matches!(self, Self::Perspective)
    }
}

/// View transform of a single viewport.
///
/// `target - position` must have non-zero length for pan, rotate, and orbit
/// to be defined; helpers return `None` when it does not.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraState {
    pub mode: CameraMode,
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Distance-like zoom factor (> 0); larger values show more of the world
    pub zoom: f32,
    /// Vertical field of view in degrees
    pub fov: Option<f32>,
    pub aspect_ratio: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            mode: CameraMode::Perspective,
            position: Vec3::new(0.0, 0.0, 10.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            zoom: 1.0,
            fov: Some(50.0),
            aspect_ratio: 1920.0 / 1080.0,
        }
    }
}

impl CameraState {
    /// Orthographic camera looking down -Z at `target`
    pub fn orthographic(target: Vec3, distance: f32) -> Self {
        Self {
            mode: CameraMode::Orthographic,
            position: target + Vec3::Z * distance,
            target,
            fov: None,
            ..Default::default()
        }
    }

    pub fn is_perspective(&self) -> bool {
        self.mode.is_perspective()
    }

    /// Vector from position to target (not normalized)
    #[inline]
    pub fn offset_to_target(&self) -> Vec3 {
        self.target - self.position
    }

    /// Distance between position and target
    #[inline]
    pub fn distance(&self) -> f32 {
        self.offset_to_target().length()
    }

    /// Normalized viewing direction, `None` when position and target coincide
    pub fn forward(&self) -> Option<Vec3> {
        let offset = self.offset_to_target();
        let len = offset.length();
        if len > DEGENERATE_LENGTH && len.is_finite() {
            Some(offset / len)
        } else {
            None
        }
    }

    /// Shallow-merge a patch; fields absent from the patch are unchanged
    pub fn apply(&mut self, patch: &CameraPatch) {
        if let Some(mode) = patch.mode {
            self.mode = mode;
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(target) = patch.target {
            self.target = target;
        }
        if let Some(up) = patch.up {
            self.up = up;
        }
        if let Some(zoom) = patch.zoom {
            self.zoom = zoom;
        }
        if let Some(fov) = patch.fov {
            self.fov = fov;
        }
        if let Some(aspect_ratio) = patch.aspect_ratio {
            self.aspect_ratio = aspect_ratio;
        }
    }

    /// Copy of this camera with a merged patch
    pub fn merged(&self, patch: &CameraPatch) -> Self {
        let mut camera = self.clone();
        camera.apply(patch);
        camera
    }

    /// Right-handed look-at view matrix for the external draw pipeline
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Projection matrix matching the camera mode.
    ///
    /// Orthographic and isometric cameras size their view volume from the
    /// zoom factor the same way the reference grid does (50 px per unit at
    /// zoom 1, for a 1080 px tall view).
    pub fn projection_matrix(&self, near: f32, far: f32) -> Mat4 {
        let aspect = if self.aspect_ratio.is_finite() && self.aspect_ratio > 0.0 {
            self.aspect_ratio
        } else {
            1.0
        };
        match self.mode {
            CameraMode::Perspective => {
                let fov = self.fov.unwrap_or(50.0);
                Mat4::perspective_rh(crate::radians(fov), aspect, near, far)
            }
            CameraMode::Orthographic | CameraMode::Isometric => {
                let half_height = 540.0 / crate::projection::grid_scale(self.zoom);
                let half_width = half_height * aspect;
                Mat4::orthographic_rh(-half_width, half_width, -half_height, half_height, near, far)
            }
        }
    }
}

/// Partial camera update; every present field overwrites the camera's
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CameraPatch {
    pub mode: Option<CameraMode>,
    pub position: Option<Vec3>,
    pub target: Option<Vec3>,
    pub up: Option<Vec3>,
    pub zoom: Option<f32>,
    /// `Some(None)` clears the field of view
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "present_field")]
    pub fov: Option<Option<f32>>,
    pub aspect_ratio: Option<f32>,
}

/// A present field, `null` included, deserializes to `Some`
fn present_field<'de, D>(deserializer: D) -> Result<Option<Option<f32>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f32>::deserialize(deserializer).map(Some)
}

impl CameraPatch {
    /// Patch that moves position and target together
    pub fn look(position: Vec3, target: Vec3) -> Self {
        Self {
            position: Some(position),
            target: Some(target),
            ..Default::default()
        }
    }

    /// Patch carrying every field of `camera`
    pub fn from_state(camera: &CameraState) -> Self {
        Self {
            mode: Some(camera.mode),
            position: Some(camera.position),
            target: Some(camera.target),
            up: Some(camera.up),
            zoom: Some(camera.zoom),
            fov: Some(camera.fov),
            aspect_ratio: Some(camera.aspect_ratio),
        }
    }

    pub fn with_zoom(mut self, zoom: f32) -> Self {
        self.zoom = Some(zoom);
        self
    }

    pub fn with_mode(mut self, mode: CameraMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_is_shallow_merge() {
        let mut camera = CameraState::default();
        let before = camera.clone();

        camera.apply(&CameraPatch {
            zoom: Some(3.0),
            ..Default::default()
        });

        assert_eq!(camera.zoom, 3.0);
        assert_eq!(camera.position, before.position);
        assert_eq!(camera.target, before.target);
        assert_eq!(camera.mode, before.mode);
        assert_eq!(camera.fov, before.fov);
    }

    #[test]
    fn test_forward_degenerate() {
        let camera = CameraState {
            position: Vec3::ONE,
            target: Vec3::ONE,
            ..Default::default()
        };
        assert!(camera.forward().is_none());

        let camera = CameraState::default();
        let forward = camera.forward().unwrap();
        assert!((forward - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn test_from_state_round_trips() {
        let camera = CameraState::orthographic(Vec3::new(1.0, 2.0, 0.0), 5.0);
        let rebuilt = CameraState::default().merged(&CameraPatch::from_state(&camera));
        assert_eq!(rebuilt.fov, None);
        assert_eq!(rebuilt.position, camera.position);
        assert_eq!(rebuilt.mode, CameraMode::Orthographic);
    }

    #[test]
    fn test_patch_clears_fov_only_when_asked() {
        let mut camera = CameraState::default();
        camera.apply(&CameraPatch::default().with_zoom(2.0));
        assert_eq!(camera.fov, Some(50.0));

        camera.apply(&CameraPatch {
            fov: Some(None),
            ..Default::default()
        });
        assert_eq!(camera.fov, None);
    }

    #[test]
    fn test_patch_fov_serde() {
        let absent: CameraPatch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.fov, None);
        let cleared: CameraPatch = serde_json::from_str(r#"{"fov":null}"#).unwrap();
        assert_eq!(cleared.fov, Some(None));
        let set: CameraPatch = serde_json::from_str(r#"{"fov":35.0}"#).unwrap();
        assert_eq!(set.fov, Some(Some(35.0)));

        assert!(!serde_json::to_string(&absent).unwrap().contains("fov"));
        let json = serde_json::to_string(&cleared).unwrap();
        assert_eq!(serde_json::from_str::<CameraPatch>(&json).unwrap(), cleared);
    }

    #[test]
    fn test_projection_matrix_is_finite_for_zero_aspect() {
        let camera = CameraState {
            aspect_ratio: 0.0,
            ..Default::default()
        };
        let m = camera.projection_matrix(0.1, 100.0);
        assert!(m.to_cols_array().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_serde_uses_camel_case() {
        let json = serde_json::to_string(&CameraState::default()).unwrap();
        assert!(json.contains("aspectRatio"));
        assert!(json.contains("\"perspective\""));
    }
}
