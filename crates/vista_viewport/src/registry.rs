//! Viewport registry
//!
//! Owns every [`ViewportState`], computes layout, tracks the active viewport,
//! and drives a shared frame loop that calls each visible viewport's callback
//! once per tick.
//!
//! All id-addressed mutators return `bool`: `false` for unknown ids, never a
//! panic or an error.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Weak};

use glam::Vec2;
use parking_lot::{Mutex, MutexGuard};
use vista_core::{IdGenerator, ViewportId};
use vista_event::{EventBus, SubscriberId};
use vista_math::{CameraPatch, CameraState};
use vista_presenter::{FrameScheduler, FrameTiming, RenderError, TaskHandle};

use crate::config::{aspect_ratio, ViewportConfigPatch, ViewportState};
use crate::error::RegistryError;
use crate::layout::Layout;
use crate::snapshot::{RegistrySnapshot, ViewportSnapshot};

/// Lifecycle and camera notifications
#[derive(Clone, Debug, PartialEq)]
pub enum RegistryEvent {
    ViewportAdded(ViewportId),
    ViewportRemoved(ViewportId),
    ViewportActivated(ViewportId),
    ViewportResized { id: ViewportId, size: Vec2 },
    /// Configuration or visibility changed
    ViewportUpdated(ViewportId),
    LayoutChanged(Layout),
    CameraChanged { id: ViewportId, camera: CameraState },
    RenderComplete { frame: u64, delta_time: f64 },
    /// A viewport callback failed; the loop keeps running
    RenderFailed {
        id: ViewportId,
        frame: u64,
        error: RenderError,
    },
}

/// What a viewport callback sees for one tick
#[derive(Clone, Debug, PartialEq)]
pub struct ViewportFrame {
    pub viewport: ViewportId,
    /// Camera as of this callback's invocation
    pub camera: CameraState,
    pub position: Vec2,
    pub size: Vec2,
    /// Milliseconds since the previous tick (0 on the first)
    pub delta_time: f64,
    pub timestamp: f64,
    /// 1-based tick number
    pub frame: u64,
}

/// Per-viewport function run by the registry frame loop
pub type ViewportCallback = Box<dyn FnMut(&ViewportFrame) -> Result<(), RenderError> + Send>;

struct CallbackSlot {
    /// Registration number; a callback taken out for a tick is only put
    /// back if its slot was not re-registered meanwhile
    seq: u64,
    callback: Option<ViewportCallback>,
}

#[derive(Default)]
struct RenderLoop {
    running: bool,
    generation: u64,
    pending: Option<TaskHandle>,
    timing: FrameTiming,
}

struct RegistryInner {
    viewports: BTreeMap<ViewportId, ViewportState>,
    callbacks: HashMap<ViewportId, CallbackSlot>,
    layout: Layout,
    container: Vec2,
    render_loop: RenderLoop,
    next_callback_seq: u64,
}

impl RegistryInner {
    /// Recompute geometry of every slotted viewport for the current layout
    fn apply_layout(&mut self) {
        let slots = self.layout.partition(self.container, self.viewports.len());
        for (state, slot) in self.viewports.values_mut().zip(slots) {
            if let Some(rect) = slot {
                state.position = rect.position();
                state.size = rect.size();
                state.camera.aspect_ratio = aspect_ratio(rect.width, rect.height);
            }
        }
    }

    fn active(&self) -> Option<ViewportId> {
        self.viewports.values().find(|v| v.active).map(|v| v.id)
    }
}

struct RegistryShared {
    ids: IdGenerator,
    scheduler: Arc<dyn FrameScheduler>,
    inner: Mutex<RegistryInner>,
    events: EventBus<RegistryEvent>,
}

/// Shared handle to the set of viewports
#[derive(Clone)]
pub struct ViewportRegistry {
    shared: Arc<RegistryShared>,
}

impl ViewportRegistry {
    /// Registry with a 1920×1080 container
    pub fn new(scheduler: Arc<dyn FrameScheduler>) -> Self {
        Self::with_container_size(scheduler, 1920, 1080)
    }

    pub fn with_container_size(scheduler: Arc<dyn FrameScheduler>, width: u32, height: u32) -> Self {
        Self {
            shared: Arc::new(RegistryShared {
                ids: IdGenerator::new(),
                scheduler,
                inner: Mutex::new(RegistryInner {
                    viewports: BTreeMap::new(),
                    callbacks: HashMap::new(),
                    layout: Layout::Single,
                    container: Vec2::new(width as f32, height as f32),
                    render_loop: RenderLoop::default(),
                    next_callback_seq: 1,
                }),
                events: EventBus::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.shared.inner.lock()
    }

    fn publish(&self, event: RegistryEvent) {
        self.shared.events.publish(&event);
    }

    /// Scheduler driving the render loop; controllers reuse it for damping
    pub fn scheduler(&self) -> Arc<dyn FrameScheduler> {
        self.shared.scheduler.clone()
    }

    // ===== Lifecycle =====

    /// Add a viewport configured by `patch` merged onto defaults.
    ///
    /// The new viewport becomes active when no other viewport is.
    pub fn add_viewport(&self, patch: Option<ViewportConfigPatch>) -> ViewportId {
        let config = patch.map(|p| p.resolve()).unwrap_or_default();
        let id = self.shared.ids.next();

        {
            let mut inner = self.lock();
            let mut state = ViewportState::new(id, config);
            state.active = inner.active().is_none();
            inner.viewports.insert(id, state);
            inner.apply_layout();
        }

        log::debug!("Added {}", id);
        self.publish(RegistryEvent::ViewportAdded(id));
        id
    }

    /// Remove a viewport and its callback
    pub fn remove_viewport(&self, id: ViewportId) -> bool {
        let activated = {
            let mut inner = self.lock();
            let Some(removed) = inner.viewports.remove(&id) else {
                return false;
            };
            inner.callbacks.remove(&id);

            let mut activated = None;
            if removed.active {
                if let Some(next) = inner.viewports.values_mut().next() {
                    next.active = true;
                    activated = Some(next.id);
                }
            }
            inner.apply_layout();
            activated
        };

        log::debug!("Removed {}", id);
        self.publish(RegistryEvent::ViewportRemoved(id));
        if let Some(next) = activated {
            self.publish(RegistryEvent::ViewportActivated(next));
        }
        true
    }

    pub fn set_active_viewport(&self, id: ViewportId) -> bool {
        {
            let mut inner = self.lock();
            if !inner.viewports.contains_key(&id) {
                return false;
            }
            for state in inner.viewports.values_mut() {
                state.active = state.id == id;
            }
        }

        self.publish(RegistryEvent::ViewportActivated(id));
        true
    }

    pub fn set_viewport_visible(&self, id: ViewportId, visible: bool) -> bool {
        let changed = {
            let mut inner = self.lock();
            let Some(state) = inner.viewports.get_mut(&id) else {
                return false;
            };
            std::mem::replace(&mut state.visible, visible) != visible
        };

        if changed {
            self.publish(RegistryEvent::ViewportUpdated(id));
        }
        true
    }

    /// Merge a configuration patch; a size change re-derives the aspect ratio
    pub fn update_viewport_config(&self, id: ViewportId, patch: &ViewportConfigPatch) -> bool {
        {
            let mut inner = self.lock();
            let Some(state) = inner.viewports.get_mut(&id) else {
                return false;
            };
            if patch.apply(&mut state.config) {
                state.size = Vec2::new(state.config.width as f32, state.config.height as f32);
                state.camera.aspect_ratio = state.config.aspect_ratio();
                inner.apply_layout();
            }
        }

        self.publish(RegistryEvent::ViewportUpdated(id));
        true
    }

    // ===== Layout =====

    pub fn set_layout(&self, layout: Layout) {
        {
            let mut inner = self.lock();
            inner.layout = layout;
            inner.apply_layout();
        }

        log::debug!("Layout set to {:?}", layout);
        self.publish(RegistryEvent::LayoutChanged(layout));
    }

    /// Resize the container and lay viewports out again
    pub fn resize(&self, width: u32, height: u32) {
        let sizes: Vec<(ViewportId, Vec2)> = {
            let mut inner = self.lock();
            inner.container = Vec2::new(width as f32, height as f32);
            inner.apply_layout();
            inner.viewports.values().map(|v| (v.id, v.size)).collect()
        };

        for (id, size) in sizes {
            self.publish(RegistryEvent::ViewportResized { id, size });
        }
    }

    // ===== Cameras =====

    /// Shallow-merge `patch` into the viewport camera
    pub fn update_camera(&self, id: ViewportId, patch: &CameraPatch) -> bool {
        let camera = {
            let mut inner = self.lock();
            let Some(state) = inner.viewports.get_mut(&id) else {
                return false;
            };
            state.camera.apply(patch);
            state.camera.clone()
        };

        self.publish(RegistryEvent::CameraChanged { id, camera });
        true
    }

    /// Copy the active camera onto every other viewport, keeping each
    /// viewport's own aspect ratio
    pub fn synchronize_cameras(&self) {
        let changed: Vec<(ViewportId, CameraState)> = {
            let mut inner = self.lock();
            let Some(source) = inner
                .viewports
                .values()
                .find(|v| v.active)
                .map(|v| v.camera.clone())
            else {
                return;
            };

            inner
                .viewports
                .values_mut()
                .filter(|v| !v.active)
                .map(|state| {
                    state.camera = CameraState {
                        aspect_ratio: state.camera.aspect_ratio,
                        ..source.clone()
                    };
                    (state.id, state.camera.clone())
                })
                .collect()
        };

        for (id, camera) in changed {
            self.publish(RegistryEvent::CameraChanged { id, camera });
        }
    }

    // ===== Queries =====

    pub fn viewport(&self, id: ViewportId) -> Option<ViewportState> {
        self.lock().viewports.get(&id).cloned()
    }

    pub fn camera(&self, id: ViewportId) -> Option<CameraState> {
        self.lock().viewports.get(&id).map(|v| v.camera.clone())
    }

    /// All viewports in id order
    pub fn viewports(&self) -> Vec<ViewportState> {
        self.lock().viewports.values().cloned().collect()
    }

    pub fn viewport_ids(&self) -> Vec<ViewportId> {
        self.lock().viewports.keys().copied().collect()
    }

    pub fn active_viewport(&self) -> Option<ViewportId> {
        self.lock().active()
    }

    pub fn viewport_count(&self) -> usize {
        self.lock().viewports.len()
    }

    pub fn layout(&self) -> Layout {
        self.lock().layout
    }

    pub fn container_size(&self) -> Vec2 {
        self.lock().container
    }

    /// First visible viewport containing a container-space point
    pub fn viewport_at(&self, point: Vec2) -> Option<ViewportId> {
        self.lock()
            .viewports
            .values()
            .filter(|v| v.visible)
            .find(|v| v.contains(point))
            .map(|v| v.id)
    }

    // ===== Render loop =====

    /// Install the frame callback of a viewport; the last registration wins
    pub fn register_render_callback<F>(&self, id: ViewportId, callback: F) -> bool
    where
        F: FnMut(&ViewportFrame) -> Result<(), RenderError> + Send + 'static,
    {
        let mut inner = self.lock();
        if !inner.viewports.contains_key(&id) {
            return false;
        }
        let seq = inner.next_callback_seq;
        inner.next_callback_seq += 1;
        inner.callbacks.insert(
            id,
            CallbackSlot {
                seq,
                callback: Some(Box::new(callback)),
            },
        );
        true
    }

    pub fn unregister_render_callback(&self, id: ViewportId) -> bool {
        self.lock().callbacks.remove(&id).is_some()
    }

    pub fn has_render_callback(&self, id: ViewportId) -> bool {
        self.lock().callbacks.contains_key(&id)
    }

    /// Start ticking; a no-op when already running
    pub fn start_render_loop(&self) {
        {
            let mut inner = self.lock();
            let render_loop = &mut inner.render_loop;
            if render_loop.running {
                return;
            }
            render_loop.running = true;
            render_loop.generation += 1;
            render_loop.timing.pause();
            let generation = render_loop.generation;
            render_loop.pending = Some(RegistryShared::request_tick(&self.shared, generation));
        }
        log::info!("Registry render loop started");
    }

    /// Stop ticking and cancel the pending frame request
    pub fn stop_render_loop(&self) {
        {
            let mut inner = self.lock();
            let render_loop = &mut inner.render_loop;
            if !render_loop.running {
                return;
            }
            render_loop.running = false;
            render_loop.generation += 1;
            if let Some(handle) = render_loop.pending.take() {
                self.shared.scheduler.cancel(handle);
            }
        }
        log::info!("Registry render loop stopped");
    }

    pub fn is_render_loop_running(&self) -> bool {
        self.lock().render_loop.running
    }

    /// Ticks run so far
    pub fn frame_count(&self) -> u64 {
        self.lock().render_loop.timing.frame_count()
    }

    // ===== Events =====

    pub fn subscribe<F>(&self, handler: F) -> SubscriberId
    where
        F: Fn(&RegistryEvent) + Send + Sync + 'static,
    {
        self.shared.events.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.shared.events.unsubscribe(id)
    }

    // ===== Persistence =====

    pub fn export_state(&self) -> RegistrySnapshot {
        let inner = self.lock();
        RegistrySnapshot {
            layout: inner.layout,
            container_size: inner.container,
            viewports: inner
                .viewports
                .values()
                .map(|v| ViewportSnapshot {
                    id: v.id,
                    config: v.config.clone(),
                    camera: v.camera.clone(),
                    position: v.position,
                    size: v.size,
                    visible: v.visible,
                })
                .collect(),
        }
    }

    /// Replace every viewport with the snapshot's.
    ///
    /// Callbacks are dropped, the lowest id becomes active, and future ids
    /// are allocated past the highest imported one. Geometry is restored as
    /// stored rather than recomputed.
    pub fn import_state(&self, snapshot: RegistrySnapshot) -> Result<(), RegistryError> {
        let mut seen = HashSet::new();
        if let Some(dup) = snapshot.viewports.iter().find(|v| !seen.insert(v.id)) {
            return Err(RegistryError::DuplicateViewport(dup.id));
        }

        let layout = snapshot.layout;
        {
            let mut inner = self.lock();
            inner.callbacks.clear();
            inner.layout = layout;
            inner.container = snapshot.container_size;
            inner.viewports = snapshot
                .viewports
                .into_iter()
                .map(|v| {
                    let state = ViewportState {
                        id: v.id,
                        config: v.config,
                        camera: v.camera,
                        active: false,
                        visible: v.visible,
                        position: v.position,
                        size: v.size,
                    };
                    (v.id, state)
                })
                .collect();

            if let Some(lowest) = inner.viewports.values_mut().next() {
                lowest.active = true;
            }
            if let Some(&highest) = inner.viewports.keys().next_back() {
                self.shared.ids.advance_past(highest);
            }
            log::info!("Imported {} viewports", inner.viewports.len());
        }

        self.publish(RegistryEvent::LayoutChanged(layout));
        Ok(())
    }

    pub fn export_json(&self) -> Result<String, RegistryError> {
        Ok(serde_json::to_string_pretty(&self.export_state())?)
    }

    pub fn import_json(&self, json: &str) -> Result<(), RegistryError> {
        let snapshot: RegistrySnapshot = serde_json::from_str(json)?;
        self.import_state(snapshot)
    }
}

impl std::fmt::Debug for ViewportRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("ViewportRegistry")
            .field("viewports", &inner.viewports.len())
            .field("layout", &inner.layout)
            .field("container", &inner.container)
            .field("running", &inner.render_loop.running)
            .finish()
    }
}

impl RegistryShared {
    fn request_tick(shared: &Arc<Self>, generation: u64) -> TaskHandle {
        let weak: Weak<Self> = Arc::downgrade(shared);
        shared.scheduler.request_frame(Box::new(move |timestamp| {
            if let Some(shared) = weak.upgrade() {
                Self::tick(&shared, generation, timestamp);
            }
        }))
    }

    fn tick(shared: &Arc<Self>, generation: u64, timestamp: f64) {
        let (delta_time, frame, mut taken) = {
            let mut inner = shared.inner.lock();
            let render_loop = &mut inner.render_loop;
            if !render_loop.running || render_loop.generation != generation {
                return;
            }
            render_loop.pending = None;
            let delta_time = render_loop.timing.begin_frame(timestamp);
            let frame = render_loop.timing.frame_count();

            let visible: Vec<ViewportId> = inner
                .viewports
                .values()
                .filter(|v| v.visible)
                .map(|v| v.id)
                .collect();
            let taken: Vec<(ViewportId, u64, ViewportCallback)> = visible
                .into_iter()
                .filter_map(|id| {
                    let slot = inner.callbacks.get_mut(&id)?;
                    let callback = slot.callback.take()?;
                    Some((id, slot.seq, callback))
                })
                .collect();
            (delta_time, frame, taken)
        };

        let mut failures = Vec::new();
        for (id, _, callback) in taken.iter_mut() {
            // Read the camera right before each call so damping or earlier
            // callbacks in this tick are visible
            let view = {
                let inner = shared.inner.lock();
                inner.viewports.get(id).filter(|v| v.visible).map(|v| ViewportFrame {
                    viewport: v.id,
                    camera: v.camera.clone(),
                    position: v.position,
                    size: v.size,
                    delta_time,
                    timestamp,
                    frame,
                })
            };
            if let Some(view) = view {
                if let Err(error) = callback(&view) {
                    log::error!("{} render callback failed on frame {}: {}", id, frame, error);
                    failures.push(RegistryEvent::RenderFailed {
                        id: *id,
                        frame,
                        error,
                    });
                }
            }
        }

        {
            let mut inner = shared.inner.lock();
            for (id, seq, callback) in taken {
                if let Some(slot) = inner.callbacks.get_mut(&id) {
                    if slot.seq == seq && slot.callback.is_none() {
                        slot.callback = Some(callback);
                    }
                }
            }

            if inner.render_loop.running && inner.render_loop.generation == generation {
                inner.render_loop.pending = Some(Self::request_tick(shared, generation));
            }
        }

        for failure in &failures {
            shared.events.publish(failure);
        }
        shared
            .events
            .publish(&RegistryEvent::RenderComplete { frame, delta_time });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vista_presenter::HostScheduler;

    fn registry() -> ViewportRegistry {
        ViewportRegistry::new(Arc::new(HostScheduler::manual()))
    }

    #[test]
    fn test_first_viewport_is_active() {
        let registry = registry();
        let id = registry.add_viewport(None);
        let state = registry.viewport(id).unwrap();
        assert!(state.active);
        assert_eq!(state.camera.aspect_ratio, 1920.0 / 1080.0);

        let second = registry.add_viewport(None);
        assert!(!registry.viewport(second).unwrap().active);
        assert_eq!(registry.active_viewport(), Some(id));
    }

    #[test]
    fn test_ids_are_not_reused() {
        let registry = registry();
        let a = registry.add_viewport(None);
        assert!(registry.remove_viewport(a));
        let b = registry.add_viewport(None);
        assert_ne!(a, b);
    }

    #[test]
    fn test_remove_unknown_is_false() {
        let registry = registry();
        registry.add_viewport(None);
        assert!(!registry.remove_viewport(ViewportId::new(99)));
        assert_eq!(registry.viewport_count(), 1);
    }

    #[test]
    fn test_unknown_ids_are_rejected() {
        let registry = registry();
        let ghost = ViewportId::new(42);
        assert!(!registry.set_active_viewport(ghost));
        assert!(!registry.update_camera(ghost, &CameraPatch::default()));
        assert!(!registry.set_viewport_visible(ghost, false));
        assert!(!registry.update_viewport_config(ghost, &ViewportConfigPatch::default()));
        assert!(!registry.register_render_callback(ghost, |_| Ok(())));
    }

    #[test]
    fn test_set_active_deactivates_others() {
        let registry = registry();
        let a = registry.add_viewport(None);
        let b = registry.add_viewport(None);
        assert!(registry.set_active_viewport(b));
        assert!(!registry.viewport(a).unwrap().active);
        assert!(registry.viewport(b).unwrap().active);
    }

    #[test]
    fn test_single_layout_leaves_others_untouched() {
        let registry =
            ViewportRegistry::with_container_size(Arc::new(HostScheduler::manual()), 800, 600);
        let a = registry.add_viewport(None);
        let b = registry.add_viewport(Some(ViewportConfigPatch::size(320, 240)));

        assert_eq!(registry.viewport(a).unwrap().size, Vec2::new(800.0, 600.0));
        let b = registry.viewport(b).unwrap();
        assert_eq!(b.size, Vec2::new(320.0, 240.0));
        assert_eq!(b.position, Vec2::ZERO);
    }

    #[test]
    fn test_update_viewport_config_rederives_aspect() {
        let registry = registry();
        registry.set_layout(Layout::Custom);
        let id = registry.add_viewport(None);
        assert!(registry.update_viewport_config(id, &ViewportConfigPatch::size(400, 400)));
        let state = registry.viewport(id).unwrap();
        assert_eq!(state.camera.aspect_ratio, 1.0);
        assert_eq!(state.size, Vec2::new(400.0, 400.0));
    }

    #[test]
    fn test_synchronize_without_active_is_noop() {
        let registry = registry();
        registry.synchronize_cameras();
        assert_eq!(registry.viewport_count(), 0);
    }

    #[test]
    fn test_viewport_at() {
        let registry =
            ViewportRegistry::with_container_size(Arc::new(HostScheduler::manual()), 1000, 500);
        let a = registry.add_viewport(None);
        let b = registry.add_viewport(None);
        registry.set_layout(Layout::Horizontal);
        assert_eq!(registry.viewport_at(Vec2::new(100.0, 100.0)), Some(a));
        assert_eq!(registry.viewport_at(Vec2::new(900.0, 100.0)), Some(b));
        assert_eq!(registry.viewport_at(Vec2::new(2000.0, 100.0)), None);
    }

    #[test]
    fn test_import_rejects_duplicate_ids() {
        let registry = registry();
        let id = registry.add_viewport(None);
        let mut snapshot = registry.export_state();
        snapshot.viewports.push(snapshot.viewports[0].clone());

        match registry.import_state(snapshot) {
            Err(RegistryError::DuplicateViewport(dup)) => assert_eq!(dup, id),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(registry.viewport_count(), 1);
    }

    #[test]
    fn test_import_json_reports_malformed_input() {
        let registry = registry();
        assert!(matches!(
            registry.import_json("{ not json"),
            Err(RegistryError::Snapshot(_))
        ));
    }
}
