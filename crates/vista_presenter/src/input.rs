//! Raw input events from the host windowing system
//!
//! Surfaces republish these verbatim; the camera controller interprets them.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Pointer button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerButton {
    Left,
    Middle,
    Right,
    Other(u16),
}

impl PointerButton {
    /// Map a DOM-style button index (0 left, 1 middle, 2 right)
    pub fn from_index(index: u16) -> Self {
        match index {
            0 => Self::Left,
            1 => Self::Middle,
            2 => Self::Right,
            other => Self::Other(other),
        }
    }
}

/// Keyboard modifiers held during a pointer or wheel event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    pub const ALT: Self = Self {
        alt: true,
        ..Self::NONE
    };

    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }
}

/// Pointer (mouse, pen) event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub pointer_id: u32,
    pub button: PointerButton,
    /// Position in surface-local logical pixels
    pub position: Vec2,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn new(pointer_id: u32, button: PointerButton, position: Vec2) -> Self {
        Self {
            pointer_id,
            button,
            position,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Wheel event; positive `delta.y` scrolls away from the content (zoom out)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelEvent {
    pub delta: Vec2,
    pub position: Vec2,
    pub modifiers: Modifiers,
}

impl WheelEvent {
    pub fn vertical(delta_y: f32) -> Self {
        Self {
            delta: Vec2::new(0.0, delta_y),
            position: Vec2::ZERO,
            modifiers: Modifiers::NONE,
        }
    }
}

/// Touch point data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub identifier: i32,
    pub position: Vec2,
}

impl TouchPoint {
    pub fn new(identifier: i32, x: f32, y: f32) -> Self {
        Self {
            identifier,
            position: Vec2::new(x, y),
        }
    }
}

/// Input event consumed by surfaces and controllers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    PointerDown(PointerEvent),
    PointerMove(PointerEvent),
    PointerUp(PointerEvent),
    /// Capture lost without a release (window blur, pointer left)
    PointerCancel(PointerEvent),
    Wheel(WheelEvent),
    /// Touches currently on the surface
    TouchStart { touches: Vec<TouchPoint> },
    TouchMove { touches: Vec<TouchPoint> },
    /// Touches remaining after the end event
    TouchEnd { touches: Vec<TouchPoint> },
}
