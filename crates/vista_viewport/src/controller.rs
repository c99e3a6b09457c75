//! Camera controller for viewport navigation.
//!
//! Translates pointer, wheel, and touch input into camera changes for one
//! viewport. Every camera write goes through
//! [`ViewportRegistry::update_camera`]; the camera is re-read from the
//! registry for each operation, never cached.
//!
//! ```text
//! pointer down ──► select_mode ──► Pan / Rotate / Orbit ──► pointer up ──► None
//!                                        │
//!                                  last velocity ──► damping loop (decays)
//! wheel / pinch ──► Zoom (momentary)
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use glam::{Quat, Vec2, Vec3};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use vista_core::ViewportId;
use vista_event::{EventBus, SubscriberId};
use vista_math::{CameraPatch, CameraState, Spherical, POLE_EPSILON};
use vista_presenter::{
    FrameScheduler, InputEvent, Modifiers, PointerButton, PointerEvent, RenderSurface,
    TaskHandle, TouchPoint, WheelEvent,
};

use crate::registry::ViewportRegistry;

/// Velocities below this magnitude snap to zero
pub const VELOCITY_EPSILON: f32 = 0.01;

/// Current interaction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlMode {
    #[default]
    None,
    Pan,
    Rotate,
    Orbit,
    Zoom,
}

/// Notifications from a controller
#[derive(Clone, Debug, PartialEq)]
pub enum ControllerEvent {
    ModeChanged { from: ControlMode, to: ControlMode },
}

/// Camera control tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    // Speeds
    /// World units per pixel per unit of target distance
    pub pan_speed: f32,
    /// Radians per pixel
    pub rotate_speed: f32,
    /// Radians per pixel
    pub orbit_speed: f32,
    /// Distance (or zoom factor) per wheel delta unit
    pub zoom_speed: f32,
    /// Distance (or zoom factor) per pixel of pinch distance change
    pub pinch_speed: f32,

    // Zoom range, as a distance in perspective and a factor otherwise
    pub min_zoom: f32,
    pub max_zoom: f32,

    // Inertia
    pub enable_damping: bool,
    /// Fraction of velocity lost per damping tick
    pub damping_factor: f32,

    // Enables
    pub enable_pan: bool,
    pub enable_rotate: bool,
    pub enable_orbit: bool,
    pub enable_zoom: bool,

    pub invert_x: bool,
    pub invert_y: bool,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            pan_speed: 0.002,
            rotate_speed: 0.005,
            orbit_speed: 0.005,
            zoom_speed: 0.01,
            pinch_speed: 0.02,
            min_zoom: 0.1,
            max_zoom: 1000.0,
            enable_damping: true,
            damping_factor: 0.1,
            enable_pan: true,
            enable_rotate: true,
            enable_orbit: true,
            enable_zoom: true,
            invert_x: false,
            invert_y: false,
        }
    }
}

/// Pick the drag mode for a pointer-down, in priority order:
/// middle or shift+left pans, alt+left rotates, right orbits (rotates for
/// non-perspective cameras), plain left orbits only in perspective.
pub fn select_mode(
    button: PointerButton,
    modifiers: Modifiers,
    perspective: bool,
    config: &ControlsConfig,
) -> ControlMode {
    let mode = match button {
        PointerButton::Middle => ControlMode::Pan,
        PointerButton::Left if modifiers.shift => ControlMode::Pan,
        PointerButton::Left if modifiers.alt => ControlMode::Rotate,
        PointerButton::Right if perspective => ControlMode::Orbit,
        PointerButton::Right => ControlMode::Rotate,
        PointerButton::Left if perspective => ControlMode::Orbit,
        _ => ControlMode::None,
    };

    let enabled = match mode {
        ControlMode::Pan => config.enable_pan,
        ControlMode::Rotate => config.enable_rotate,
        ControlMode::Orbit => config.enable_orbit,
        ControlMode::Zoom => config.enable_zoom,
        ControlMode::None => true,
    };
    if enabled {
        mode
    } else {
        ControlMode::None
    }
}

// ============================================================================
// Camera math
// ============================================================================

/// Translate position and target in the camera plane
pub fn pan_camera(camera: &CameraState, delta: Vec2, speed: f32) -> Option<CameraPatch> {
    let forward = camera.forward()?;
    let right = forward.cross(camera.up).try_normalize()?;
    let true_up = right.cross(forward);
    let offset = (-right * delta.x + true_up * delta.y) * camera.distance() * speed;

    Some(CameraPatch {
        position: Some(camera.position + offset),
        target: Some(camera.target + offset),
        ..Default::default()
    })
}

/// Turn the view direction in place: yaw about world up, then pitch about the
/// camera right axis. There is no pole clamp.
pub fn rotate_camera(camera: &CameraState, delta: Vec2, speed: f32) -> Option<CameraPatch> {
    let forward = camera.forward()?;
    let distance = camera.distance();
    let up = camera.up.try_normalize().unwrap_or(Vec3::Y);

    let yawed = Quat::from_axis_angle(up, -delta.x * speed) * forward;
    let rotated = match yawed.cross(up).try_normalize() {
        Some(right) => Quat::from_axis_angle(right, -delta.y * speed) * yawed,
        None => yawed,
    };

    Some(CameraPatch {
        target: Some(camera.position + rotated.normalize() * distance),
        ..Default::default()
    })
}

/// Move the position around the target at constant radius
pub fn orbit_camera(camera: &CameraState, delta: Vec2, speed: f32) -> Option<CameraPatch> {
    camera.forward()?;

    let mut spherical = Spherical::from_offset(camera.position - camera.target);
    spherical.theta -= delta.x * speed;
    spherical.phi -= delta.y * speed;
    let spherical = spherical.clamp_phi(POLE_EPSILON);

    Some(CameraPatch {
        position: Some(camera.target + spherical.to_offset()),
        ..Default::default()
    })
}

/// Dolly (perspective) or scale the zoom factor by `amount`, clamped to
/// `[min, max]`
pub fn zoom_camera(camera: &CameraState, amount: f32, min: f32, max: f32) -> Option<CameraPatch> {
    if camera.is_perspective() {
        let back = -camera.forward()?;
        let distance = (camera.distance() + amount).clamp(min, max);
        Some(CameraPatch {
            position: Some(camera.target + back * distance),
            ..Default::default()
        })
    } else {
        Some(CameraPatch {
            zoom: Some((camera.zoom + amount).clamp(min, max)),
            ..Default::default()
        })
    }
}

// ============================================================================
// Controller
// ============================================================================

#[derive(Default)]
struct DampingLoop {
    running: bool,
    generation: u64,
    pending: Option<TaskHandle>,
}

struct ControllerState {
    config: ControlsConfig,
    enabled: bool,
    mode: ControlMode,
    /// Last drag mode, reused by damping after release
    drag_mode: ControlMode,
    /// Captured pointer id -> last position
    captured: HashMap<u32, Vec2>,
    pointer_velocity: Vec2,
    /// Zoom amount per tick, already scaled
    wheel_velocity: f32,
    pinch_distance: Option<f32>,
    attachment: Option<(RenderSurface, SubscriberId)>,
    initial_camera: Option<CameraState>,
    damping: DampingLoop,
}

impl ControllerState {
    fn interacting(&self) -> bool {
        !self.captured.is_empty()
    }

    fn oriented(&self, delta: Vec2) -> Vec2 {
        Vec2::new(
            if self.config.invert_x { -delta.x } else { delta.x },
            if self.config.invert_y { -delta.y } else { delta.y },
        )
    }
}

enum CameraOp {
    Drag(ControlMode, Vec2),
    Zoom(f32),
}

struct ControllerShared {
    registry: ViewportRegistry,
    viewport: ViewportId,
    scheduler: Arc<dyn FrameScheduler>,
    state: Mutex<ControllerState>,
    events: EventBus<ControllerEvent>,
}

/// Input-driven camera controller bound to one viewport
#[derive(Clone)]
pub struct CameraController {
    shared: Arc<ControllerShared>,
}

impl CameraController {
    pub fn new(registry: ViewportRegistry, viewport: ViewportId, config: ControlsConfig) -> Self {
        let scheduler = registry.scheduler();
        Self {
            shared: Arc::new(ControllerShared {
                registry,
                viewport,
                scheduler,
                state: Mutex::new(ControllerState {
                    config,
                    enabled: true,
                    mode: ControlMode::None,
                    drag_mode: ControlMode::None,
                    captured: HashMap::new(),
                    pointer_velocity: Vec2::ZERO,
                    wheel_velocity: 0.0,
                    pinch_distance: None,
                    attachment: None,
                    initial_camera: None,
                    damping: DampingLoop::default(),
                }),
                events: EventBus::new(),
            }),
        }
    }

    pub fn viewport(&self) -> ViewportId {
        self.shared.viewport
    }

    pub fn mode(&self) -> ControlMode {
        self.shared.state.lock().mode
    }

    pub fn config(&self) -> ControlsConfig {
        self.shared.state.lock().config.clone()
    }

    pub fn set_config(&self, config: ControlsConfig) {
        self.shared.state.lock().config = config;
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.state.lock().enabled
    }

    pub fn is_attached(&self) -> bool {
        self.shared.state.lock().attachment.is_some()
    }

    /// Residual pointer velocity (pixels per tick)
    pub fn pointer_velocity(&self) -> Vec2 {
        self.shared.state.lock().pointer_velocity
    }

    /// Residual zoom velocity (zoom units per tick)
    pub fn wheel_velocity(&self) -> f32 {
        self.shared.state.lock().wheel_velocity
    }

    pub fn is_damping_running(&self) -> bool {
        self.shared.state.lock().damping.running
    }

    /// Listen to a surface's input and start the damping loop
    pub fn attach(&self, surface: &RenderSurface) {
        self.detach();

        let weak: Weak<ControllerShared> = Arc::downgrade(&self.shared);
        let subscription = surface.input_events().subscribe(move |event: &InputEvent| {
            if let Some(shared) = weak.upgrade() {
                shared.handle_input(event);
            }
        });

        let initial_camera = self.shared.registry.camera(self.shared.viewport);
        {
            let mut state = self.shared.state.lock();
            state.attachment = Some((surface.clone(), subscription));
            state.initial_camera = initial_camera;
        }
        log::debug!("Camera controller attached to {}", self.shared.viewport);

        if self.is_enabled() {
            ControllerShared::start_damping(&self.shared);
        }
    }

    /// Stop listening to the attached surface and release every pointer
    pub fn detach(&self) {
        let attachment = {
            let mut state = self.shared.state.lock();
            state.captured.clear();
            state.pinch_distance = None;
            state.attachment.take()
        };

        if let Some((surface, subscription)) = attachment {
            surface.input_events().unsubscribe(subscription);
            log::debug!("Camera controller detached from {}", self.shared.viewport);
        }
        self.shared.set_mode(ControlMode::None);
    }

    /// Enable or disable input handling; disabling also halts inertia
    pub fn set_enabled(&self, enabled: bool) {
        let was = std::mem::replace(&mut self.shared.state.lock().enabled, enabled);
        if was == enabled {
            return;
        }

        if enabled {
            ControllerShared::start_damping(&self.shared);
        } else {
            self.shared.stop_damping();
            {
                let mut state = self.shared.state.lock();
                state.captured.clear();
                state.pointer_velocity = Vec2::ZERO;
                state.wheel_velocity = 0.0;
            }
            self.shared.set_mode(ControlMode::None);
        }
    }

    /// Detach, cancel the damping loop, and drop residual velocity
    pub fn dispose(&self) {
        self.detach();
        self.shared.stop_damping();
        let mut state = self.shared.state.lock();
        state.pointer_velocity = Vec2::ZERO;
        state.wheel_velocity = 0.0;
    }

    /// Feed one input event directly
    pub fn handle_input(&self, event: &InputEvent) {
        self.shared.handle_input(event);
    }

    /// Restore the camera captured when the controller was attached
    pub fn reset_camera(&self) -> bool {
        let initial = {
            let mut state = self.shared.state.lock();
            state.pointer_velocity = Vec2::ZERO;
            state.wheel_velocity = 0.0;
            state.initial_camera.clone()
        };
        match initial {
            Some(camera) => self
                .shared
                .registry
                .update_camera(self.shared.viewport, &CameraPatch::from_state(&camera)),
            None => false,
        }
    }

    /// Look at `target` from `distance` along the current view direction
    pub fn frame_point(&self, target: Vec3, distance: f32) -> bool {
        let Some(camera) = self.shared.registry.camera(self.shared.viewport) else {
            return false;
        };
        let direction = camera.forward().unwrap_or(Vec3::NEG_Z);
        let (min, max) = {
            let state = self.shared.state.lock();
            (state.config.min_zoom, state.config.max_zoom)
        };
        let distance = distance.clamp(min, max);

        self.shared.registry.update_camera(
            self.shared.viewport,
            &CameraPatch::look(target - direction * distance, target),
        )
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriberId
    where
        F: Fn(&ControllerEvent) + Send + Sync + 'static,
    {
        self.shared.events.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.shared.events.unsubscribe(id)
    }
}

impl ControllerShared {
    fn handle_input(&self, event: &InputEvent) {
        if !self.state.lock().enabled {
            return;
        }

        match event {
            InputEvent::PointerDown(pointer) => self.pointer_down(pointer),
            InputEvent::PointerMove(pointer) => self.pointer_move(pointer),
            InputEvent::PointerUp(pointer) | InputEvent::PointerCancel(pointer) => {
                self.pointer_up(pointer)
            }
            InputEvent::Wheel(wheel) => self.wheel(wheel),
            InputEvent::TouchStart { touches } | InputEvent::TouchEnd { touches } => {
                self.reset_pinch(touches)
            }
            InputEvent::TouchMove { touches } => self.touch_move(touches),
        }
    }

    fn pointer_down(&self, pointer: &PointerEvent) {
        let Some(camera) = self.registry.camera(self.viewport) else {
            return;
        };

        let mode = {
            let mut state = self.state.lock();
            let mode = select_mode(
                pointer.button,
                pointer.modifiers,
                camera.is_perspective(),
                &state.config,
            );
            if mode == ControlMode::None {
                return;
            }
            state.captured.insert(pointer.pointer_id, pointer.position);
            state.drag_mode = mode;
            state.pointer_velocity = Vec2::ZERO;
            mode
        };

        self.set_mode(mode);
    }

    fn pointer_move(&self, pointer: &PointerEvent) {
        let op = {
            let mut state = self.state.lock();
            let Some(last) = state.captured.get_mut(&pointer.pointer_id) else {
                return;
            };
            let raw = pointer.position - *last;
            *last = pointer.position;

            let delta = state.oriented(raw);
            state.pointer_velocity = delta;
            CameraOp::Drag(state.mode, delta)
        };

        self.apply(op);
    }

    fn pointer_up(&self, pointer: &PointerEvent) {
        let released_all = {
            let mut state = self.state.lock();
            state.captured.remove(&pointer.pointer_id).is_some() && !state.interacting()
        };
        if released_all {
            self.set_mode(ControlMode::None);
        }
    }

    fn wheel(&self, wheel: &WheelEvent) {
        let (amount, previous) = {
            let mut state = self.state.lock();
            if !state.config.enable_zoom {
                return;
            }
            let amount = wheel.delta.y * state.config.zoom_speed;
            state.wheel_velocity = amount;
            (amount, state.mode)
        };

        self.set_mode(ControlMode::Zoom);
        self.apply(CameraOp::Zoom(amount));
        self.set_mode(previous);
    }

    fn distance_between(touches: &[TouchPoint]) -> Option<f32> {
        match touches {
            [a, b] => Some(a.position.distance(b.position)),
            _ => None,
        }
    }

    fn reset_pinch(&self, touches: &[TouchPoint]) {
        self.state.lock().pinch_distance = Self::distance_between(touches);
    }

    fn touch_move(&self, touches: &[TouchPoint]) {
        let amount = {
            let mut state = self.state.lock();
            let current = Self::distance_between(touches);
            let previous = std::mem::replace(&mut state.pinch_distance, current);
            match (previous, current) {
                (Some(previous), Some(current)) if state.config.enable_zoom => {
                    (previous - current) * state.config.pinch_speed
                }
                _ => return,
            }
        };

        self.apply(CameraOp::Zoom(amount));
    }

    fn set_mode(&self, to: ControlMode) {
        let from = std::mem::replace(&mut self.state.lock().mode, to);
        if from != to {
            log::debug!("{} control mode {:?} -> {:?}", self.viewport, from, to);
            self.events.publish(&ControllerEvent::ModeChanged { from, to });
        }
    }

    /// Read the current camera, compute the change, write it back
    fn apply(&self, op: CameraOp) {
        let Some(camera) = self.registry.camera(self.viewport) else {
            return;
        };
        let config = self.state.lock().config.clone();

        let patch = match op {
            CameraOp::Drag(ControlMode::Pan, delta) => pan_camera(&camera, delta, config.pan_speed),
            CameraOp::Drag(ControlMode::Rotate, delta) => {
                rotate_camera(&camera, delta, config.rotate_speed)
            }
            CameraOp::Drag(ControlMode::Orbit, delta) => {
                orbit_camera(&camera, delta, config.orbit_speed)
            }
            CameraOp::Drag(ControlMode::Zoom | ControlMode::None, _) => None,
            CameraOp::Zoom(amount) => zoom_camera(&camera, amount, config.min_zoom, config.max_zoom),
        };

        if let Some(patch) = patch {
            self.registry.update_camera(self.viewport, &patch);
        }
    }

    // ===== Damping loop =====

    fn start_damping(shared: &Arc<Self>) {
        let mut state = shared.state.lock();
        if state.damping.running {
            return;
        }
        state.damping.running = true;
        state.damping.generation += 1;
        let generation = state.damping.generation;
        state.damping.pending = Some(Self::request_damping_tick(shared, generation));
    }

    fn stop_damping(&self) {
        let mut state = self.state.lock();
        if !state.damping.running {
            return;
        }
        state.damping.running = false;
        state.damping.generation += 1;
        if let Some(handle) = state.damping.pending.take() {
            self.scheduler.cancel(handle);
        }
    }

    fn request_damping_tick(shared: &Arc<Self>, generation: u64) -> TaskHandle {
        let weak: Weak<Self> = Arc::downgrade(shared);
        shared.scheduler.request_frame(Box::new(move |_| {
            if let Some(shared) = weak.upgrade() {
                Self::damping_tick(&shared, generation);
            }
        }))
    }

    fn damping_tick(shared: &Arc<Self>, generation: u64) {
        let ops = {
            let mut state = shared.state.lock();
            if !state.damping.running || state.damping.generation != generation {
                return;
            }
            state.damping.pending = None;

            let mut ops = Vec::new();
            if state.config.enable_damping && !state.interacting() {
                let decay = 1.0 - state.config.damping_factor.clamp(0.0, 1.0);

                if state.pointer_velocity.length() >= VELOCITY_EPSILON {
                    ops.push(CameraOp::Drag(state.drag_mode, state.pointer_velocity));
                    state.pointer_velocity *= decay;
                }
                if state.pointer_velocity.length() < VELOCITY_EPSILON {
                    state.pointer_velocity = Vec2::ZERO;
                }

                if state.wheel_velocity.abs() >= VELOCITY_EPSILON {
                    ops.push(CameraOp::Zoom(state.wheel_velocity));
                    state.wheel_velocity *= decay;
                }
                if state.wheel_velocity.abs() < VELOCITY_EPSILON {
                    state.wheel_velocity = 0.0;
                }
            }
            ops
        };

        for op in ops {
            shared.apply(op);
        }

        let mut state = shared.state.lock();
        if state.damping.running && state.damping.generation == generation {
            state.damping.pending = Some(Self::request_damping_tick(shared, generation));
        }
    }
}
