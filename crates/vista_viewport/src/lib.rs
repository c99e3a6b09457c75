//! Vista Viewport
//!
//! Multi-viewport coordination and interaction on top of `vista_presenter`.
//!
//! ## Features
//!
//! - **Registry**: viewport lifecycle, active viewport, layouts, per-viewport render callbacks
//! - **Camera Controls**: pan, rotate, orbit, and zoom with inertial damping and pinch zoom
//! - **Reference Grid**: major/minor lines for the visible region, axes, snapping
//! - **Overlays**: text, measurements, dimensions, annotations, and shapes in screen space
//! - **Settings**: TOML-backed viewer preferences
//!
//! ## Architecture
//!
//! ```text
//! InputEvent → CameraController → ViewportRegistry::update_camera → CameraChanged
//!                                                │
//!                     render loop tick ◄─────────┘ (camera re-read every frame)
//!                          │
//!                          ├─► calculate_grid_lines
//!                          └─► render_overlays
//! ```
//!
//! The registry is the only writer of camera state.

pub mod config;
pub mod controller;
pub mod error;
pub mod grid;
pub mod layout;
pub mod overlay;
pub mod panels;
pub mod registry;
pub mod settings;
pub mod snapshot;

// Re-export commonly used types
pub use config::{ViewportConfig, ViewportConfigPatch, ViewportState};

pub use controller::{
    select_mode, CameraController, ControlMode, ControllerEvent, ControlsConfig,
};

pub use error::{RegistryError, SettingsError};

pub use grid::{
    calculate_grid_lines, grid_lod, snap_angle, snap_to_grid, GridConfig, GridGeometry, GridLine,
    SnapConfig,
};

pub use layout::Layout;

pub use overlay::{
    render_overlays, OverlayElement, OverlayKind, OverlayPoint, ProjectedOverlay, ScreenPrimitive,
};

pub use panels::{coordinate_panel, fps_panel, stats_panel, PanelRow};

pub use registry::{RegistryEvent, ViewportCallback, ViewportFrame, ViewportRegistry};

pub use settings::ViewerSettings;

pub use snapshot::{RegistrySnapshot, ViewportSnapshot};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{ViewportConfig, ViewportConfigPatch, ViewportState};
    pub use crate::controller::{CameraController, ControlMode, ControlsConfig};
    pub use crate::grid::{GridConfig, SnapConfig};
    pub use crate::layout::Layout;
    pub use crate::overlay::{OverlayElement, OverlayKind, OverlayPoint};
    pub use crate::registry::{RegistryEvent, ViewportFrame, ViewportRegistry};
    pub use crate::settings::ViewerSettings;
    pub use vista_math::{CameraPatch, CameraState};
}
