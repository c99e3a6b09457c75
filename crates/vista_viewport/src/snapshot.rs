//! Serializable registry shape for external persistence.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use vista_core::ViewportId;
use vista_math::CameraState;

use crate::config::ViewportConfig;
use crate::layout::Layout;

/// `{layout, containerSize, viewports: [...]}`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySnapshot {
    pub layout: Layout,
    pub container_size: Vec2,
    pub viewports: Vec<ViewportSnapshot>,
}

/// One viewport inside a [`RegistrySnapshot`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportSnapshot {
    pub id: ViewportId,
    pub config: ViewportConfig,
    pub camera: CameraState,
    pub position: Vec2,
    pub size: Vec2,
    #[serde(default = "visible_by_default")]
    pub visible: bool,
}

fn visible_by_default() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_defaults_to_true() {
        let json = r##"{
            "id": 3,
            "config": {},
            "camera": {
                "mode": "orthographic",
                "position": [0.0, 0.0, 5.0],
                "target": [0.0, 0.0, 0.0],
                "up": [0.0, 1.0, 0.0],
                "zoom": 2.0,
                "fov": null,
                "aspectRatio": 1.5
            },
            "position": [0.0, 0.0],
            "size": [300.0, 200.0]
        }"##;
        let snapshot: ViewportSnapshot = serde_json::from_str(json).unwrap();
        assert!(snapshot.visible);
        assert_eq!(snapshot.id, ViewportId::new(3));
        assert_eq!(snapshot.config, ViewportConfig::default());
        assert_eq!(snapshot.camera.zoom, 2.0);
    }
}
