//! Viewport configuration and state.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use vista_core::{Color, ViewportId};
use vista_math::CameraState;
use vista_presenter::SurfaceConfig;

/// Per-viewport rendering configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewportConfig {
    // Size (logical pixels)
    pub width: u32,
    pub height: u32,

    // Output
    pub background: Color,
    pub msaa_samples: u32,
    pub vsync: bool,
    /// Frame-rate cap, 0 = unlimited
    pub max_fps: u32,

    // Visibility determination hints for the draw pipeline
    pub enable_culling: bool,
    pub enable_occlusion: bool,
    pub enable_lod: bool,

    // Grid defaults
    pub show_grid: bool,
    pub grid_size: f32,
    pub grid_subdivisions: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            background: Color::DARK_GREY,
            msaa_samples: 4,
            vsync: true,
            max_fps: 0,
            enable_culling: true,
            enable_occlusion: false,
            enable_lod: true,
            show_grid: true,
            grid_size: 1.0,
            grid_subdivisions: 10,
        }
    }
}

impl ViewportConfig {
    /// Width over height; 1.0 for a zero height
    pub fn aspect_ratio(&self) -> f32 {
        aspect_ratio(self.width as f32, self.height as f32)
    }

    /// Configuration for a render surface backing this viewport
    pub fn surface_config(&self) -> SurfaceConfig {
        SurfaceConfig {
            width: self.width,
            height: self.height,
            background: self.background,
            msaa_samples: self.msaa_samples,
            vsync: self.vsync,
            max_fps: self.max_fps,
            ..SurfaceConfig::default()
        }
    }
}

/// Partial viewport configuration merged onto defaults or an existing config.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewportConfigPatch {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub background: Option<Color>,
    pub msaa_samples: Option<u32>,
    pub vsync: Option<bool>,
    pub max_fps: Option<u32>,
    pub enable_culling: Option<bool>,
    pub enable_occlusion: Option<bool>,
    pub enable_lod: Option<bool>,
    pub show_grid: Option<bool>,
    pub grid_size: Option<f32>,
    pub grid_subdivisions: Option<u32>,
}

impl ViewportConfigPatch {
    pub fn size(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    /// Merge onto `config`; returns whether width or height changed
    pub fn apply(&self, config: &mut ViewportConfig) -> bool {
        let old_size = (config.width, config.height);

        macro_rules! merge {
            ($($field:ident),*) => {
                $(if let Some(value) = self.$field {
                    config.$field = value;
                })*
            };
        }
        merge!(
            width,
            height,
            background,
            msaa_samples,
            vsync,
            max_fps,
            enable_culling,
            enable_occlusion,
            enable_lod,
            show_grid,
            grid_size,
            grid_subdivisions
        );

        old_size != (config.width, config.height)
    }

    /// Defaults with this patch merged on top
    pub fn resolve(&self) -> ViewportConfig {
        let mut config = ViewportConfig::default();
        self.apply(&mut config);
        config
    }
}

impl From<&ViewportConfig> for ViewportConfigPatch {
    /// Patch that reproduces `config` exactly
    fn from(config: &ViewportConfig) -> Self {
        Self {
            width: Some(config.width),
            height: Some(config.height),
            background: Some(config.background),
            msaa_samples: Some(config.msaa_samples),
            vsync: Some(config.vsync),
            max_fps: Some(config.max_fps),
            enable_culling: Some(config.enable_culling),
            enable_occlusion: Some(config.enable_occlusion),
            enable_lod: Some(config.enable_lod),
            show_grid: Some(config.show_grid),
            grid_size: Some(config.grid_size),
            grid_subdivisions: Some(config.grid_subdivisions),
        }
    }
}

/// State of one viewport as owned by the registry.
///
/// Handed out by value; changes go through registry operations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportState {
    pub id: ViewportId,
    pub config: ViewportConfig,
    pub camera: CameraState,
    pub active: bool,
    pub visible: bool,
    /// Top-left corner in container coordinates, set by layout
    pub position: Vec2,
    /// Size in logical pixels, set by layout
    pub size: Vec2,
}

impl ViewportState {
    pub(crate) fn new(id: ViewportId, config: ViewportConfig) -> Self {
        let camera = CameraState {
            aspect_ratio: config.aspect_ratio(),
            ..CameraState::default()
        };
        let size = Vec2::new(config.width as f32, config.height as f32);
        Self {
            id,
            config,
            camera,
            active: false,
            visible: true,
            position: Vec2::ZERO,
            size,
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        aspect_ratio(self.size.x, self.size.y)
    }

    /// Whether a container-space point falls inside this viewport
    pub fn contains(&self, point: Vec2) -> bool {
        vista_math::Rect::new(self.position.x, self.position.y, self.size.x, self.size.y)
            .contains(point)
    }
}

/// Width over height, 1.0 when the height is zero
pub(crate) fn aspect_ratio(width: f32, height: f32) -> f32 {
    if height > 0.0 {
        width / height
    } else {
        1.0
    }
}
