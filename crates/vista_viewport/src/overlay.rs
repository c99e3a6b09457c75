//! Screen-space overlays.
//!
//! Overlay elements describe annotations in world or screen coordinates.
//! [`render_overlays`] resolves them against a camera into flat
//! [`ScreenPrimitive`] lists the host can draw directly.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use vista_core::Color;
use vista_math::{is_on_screen, screen_to_world, world_to_screen, CameraState, Rect};

/// z-index used when an element does not set one
pub const DEFAULT_Z_INDEX: i32 = 100;

/// Point in either coordinate space
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OverlayPoint {
    /// Pixels from the viewport's top-left corner
    Screen(Vec2),
    /// World position, projected through the grid transform
    World(Vec3),
}

impl OverlayPoint {
    pub fn to_screen(&self, camera: &CameraState, viewport: Vec2) -> Vec2 {
        match *self {
            Self::Screen(point) => point,
            Self::World(point) => world_to_screen(point, camera, viewport),
        }
    }

    pub fn to_world(&self, camera: &CameraState, viewport: Vec2) -> Vec3 {
        match *self {
            Self::Screen(point) => screen_to_world(point, camera, viewport),
            Self::World(point) => point,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CursorStyle {
    #[default]
    Crosshair,
    Pointer,
    Cross,
}

/// What an overlay element draws
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OverlayKind {
    Text {
        position: OverlayPoint,
        text: String,
        color: Color,
        font_size: f32,
    },
    /// Segment labelled with its world length
    Measurement {
        start: OverlayPoint,
        end: OverlayPoint,
        units: String,
        color: Color,
    },
    /// Measurement drawn `offset` pixels to the side, with extension lines
    Dimension {
        start: OverlayPoint,
        end: OverlayPoint,
        offset: f32,
        units: String,
        label: Option<String>,
        color: Color,
    },
    /// Label placed `label_offset` pixels from its anchor, joined by a leader
    Annotation {
        anchor: OverlayPoint,
        label_offset: Vec2,
        text: String,
        color: Color,
    },
    Cursor {
        position: OverlayPoint,
        style: CursorStyle,
        size: f32,
        color: Color,
    },
    /// Two points draw a segment, more draw a polyline
    Line {
        points: Vec<OverlayPoint>,
        width: f32,
        color: Color,
    },
    Rectangle {
        corner: OverlayPoint,
        opposite: OverlayPoint,
        filled: bool,
        color: Color,
    },
    Circle {
        center: OverlayPoint,
        /// Pixels
        radius: f32,
        filled: bool,
        color: Color,
    },
}

impl OverlayKind {
    /// Every point the element is anchored to
    pub fn input_points(&self) -> Vec<OverlayPoint> {
        match self {
            Self::Text { position, .. } | Self::Cursor { position, .. } => vec![*position],
            Self::Measurement { start, end, .. } | Self::Dimension { start, end, .. } => {
                vec![*start, *end]
            }
            Self::Annotation { anchor, .. } => vec![*anchor],
            Self::Line { points, .. } => points.clone(),
            Self::Rectangle {
                corner, opposite, ..
            } => vec![*corner, *opposite],
            Self::Circle { center, .. } => vec![*center],
        }
    }
}

/// One overlay element
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayElement {
    pub id: String,
    #[serde(default = "visible_by_default")]
    pub visible: bool,
    #[serde(default)]
    pub z_index: Option<i32>,
    #[serde(default = "opaque")]
    pub opacity: f32,
    pub kind: OverlayKind,
}

fn visible_by_default() -> bool {
    true
}

fn opaque() -> f32 {
    1.0
}

impl OverlayElement {
    pub fn new(id: impl Into<String>, kind: OverlayKind) -> Self {
        Self {
            id: id.into(),
            visible: true,
            z_index: None,
            opacity: 1.0,
            kind,
        }
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = Some(z_index);
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn effective_z_index(&self) -> i32 {
        self.z_index.unwrap_or(DEFAULT_Z_INDEX)
    }
}

/// Drawable produced by projection, in viewport pixels
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ScreenPrimitive {
    Text {
        position: Vec2,
        text: String,
        color: Color,
        font_size: f32,
    },
    Line {
        start: Vec2,
        end: Vec2,
        width: f32,
        color: Color,
    },
    Polyline {
        points: Vec<Vec2>,
        width: f32,
        color: Color,
    },
    Rect {
        rect: Rect,
        filled: bool,
        color: Color,
    },
    Circle {
        center: Vec2,
        radius: f32,
        filled: bool,
        color: Color,
    },
    Cursor {
        position: Vec2,
        style: CursorStyle,
        size: f32,
        color: Color,
    },
}

/// A visible element resolved to screen primitives
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectedOverlay {
    pub id: String,
    pub z_index: i32,
    pub primitives: Vec<ScreenPrimitive>,
}

const LABEL_FONT_SIZE: f32 = 12.0;
const LINE_WIDTH: f32 = 1.0;

/// Resolve overlay elements for one viewport.
///
/// Hidden elements and elements with any anchor outside the viewport are
/// skipped; the rest come back in ascending z-index order, ties keeping
/// their input order.
pub fn render_overlays(
    elements: &[OverlayElement],
    camera: &CameraState,
    viewport: Vec2,
) -> Vec<ProjectedOverlay> {
    let mut ordered: Vec<&OverlayElement> = elements.iter().filter(|e| e.visible).collect();
    ordered.sort_by_key(|e| e.effective_z_index());

    ordered
        .into_iter()
        .filter_map(|element| {
            let on_screen = element
                .kind
                .input_points()
                .iter()
                .all(|p| is_on_screen(p.to_screen(camera, viewport), viewport));
            if !on_screen {
                log::trace!("Overlay '{}' is off screen", element.id);
                return None;
            }

            Some(ProjectedOverlay {
                id: element.id.clone(),
                z_index: element.effective_z_index(),
                primitives: project(&element.kind, element.opacity, camera, viewport),
            })
        })
        .collect()
}

/// Distance label with two decimals, e.g. `"3.16 m"`
pub fn format_distance(distance: f32, units: &str) -> String {
    if units.is_empty() {
        format!("{distance:.2}")
    } else {
        format!("{distance:.2} {units}")
    }
}

fn project(kind: &OverlayKind, opacity: f32, camera: &CameraState, viewport: Vec2) -> Vec<ScreenPrimitive> {
    let screen = |p: &OverlayPoint| p.to_screen(camera, viewport);
    let tint = |c: &Color| c.with_opacity(opacity);

    match kind {
        OverlayKind::Text {
            position,
            text,
            color,
            font_size,
        } => vec![ScreenPrimitive::Text {
            position: screen(position),
            text: text.clone(),
            color: tint(color),
            font_size: *font_size,
        }],

        OverlayKind::Measurement {
            start,
            end,
            units,
            color,
        } => {
            let (a, b) = (screen(start), screen(end));
            let distance = start
                .to_world(camera, viewport)
                .distance(end.to_world(camera, viewport));
            vec![
                ScreenPrimitive::Line {
                    start: a,
                    end: b,
                    width: LINE_WIDTH,
                    color: tint(color),
                },
                ScreenPrimitive::Text {
                    position: (a + b) * 0.5,
                    text: format_distance(distance, units),
                    color: tint(color),
                    font_size: LABEL_FONT_SIZE,
                },
            ]
        }

        OverlayKind::Dimension {
            start,
            end,
            offset,
            units,
            label,
            color,
        } => {
            let (a, b) = (screen(start), screen(end));
            let normal = (b - a).normalize_or_zero().perp();
            let (a2, b2) = (a + normal * *offset, b + normal * *offset);
            let text = label.clone().unwrap_or_else(|| {
                let distance = start
                    .to_world(camera, viewport)
                    .distance(end.to_world(camera, viewport));
                format_distance(distance, units)
            });
            let line = |start, end| ScreenPrimitive::Line {
                start,
                end,
                width: LINE_WIDTH,
                color: tint(color),
            };
            vec![
                line(a, a2),
                line(b, b2),
                line(a2, b2),
                ScreenPrimitive::Text {
                    position: (a2 + b2) * 0.5,
                    text,
                    color: tint(color),
                    font_size: LABEL_FONT_SIZE,
                },
            ]
        }

        OverlayKind::Annotation {
            anchor,
            label_offset,
            text,
            color,
        } => {
            let at = screen(anchor);
            let label = at + *label_offset;
            vec![
                ScreenPrimitive::Line {
                    start: at,
                    end: label,
                    width: LINE_WIDTH,
                    color: tint(color),
                },
                ScreenPrimitive::Text {
                    position: label,
                    text: text.clone(),
                    color: tint(color),
                    font_size: LABEL_FONT_SIZE,
                },
            ]
        }

        OverlayKind::Cursor {
            position,
            style,
            size,
            color,
        } => vec![ScreenPrimitive::Cursor {
            position: screen(position),
            style: *style,
            size: *size,
            color: tint(color),
        }],

        OverlayKind::Line {
            points,
            width,
            color,
        } => match points.as_slice() {
            [] | [_] => Vec::new(),
            [a, b] => vec![ScreenPrimitive::Line {
                start: screen(a),
                end: screen(b),
                width: *width,
                color: tint(color),
            }],
            _ => vec![ScreenPrimitive::Polyline {
                points: points.iter().map(screen).collect(),
                width: *width,
                color: tint(color),
            }],
        },

        OverlayKind::Rectangle {
            corner,
            opposite,
            filled,
            color,
        } => {
            let (a, b) = (screen(corner), screen(opposite));
            let min = a.min(b);
            let size = a.max(b) - min;
            vec![ScreenPrimitive::Rect {
                rect: Rect::new(min.x, min.y, size.x, size.y),
                filled: *filled,
                color: tint(color),
            }]
        }

        OverlayKind::Circle {
            center,
            radius,
            filled,
            color,
        } => vec![ScreenPrimitive::Circle {
            center: screen(center),
            radius: *radius,
            filled: *filled,
            color: tint(color),
        }],
    }
}
