//! Render surface
//!
//! A [`RenderSurface`] owns one graphics context and drives a render
//! callback from the injected [`FrameScheduler`].
//!
//! ```text
//! Uninitialized ──initialize()──► Initializing ──► Ready ──start()──► RenderingLoop
//!       ▲                              │             ▲                    │
//!       │                              ▼             └──────stop()────────┘
//!       └─────────dispose()────────  Error
//! ```
//!
//! The surface is a cheap handle (`Clone`); scheduled frame tasks hold a weak
//! reference, so dropping every handle ends the loop.

use std::sync::{Arc, Weak};
use std::time::Instant;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use vista_core::{Color, SurfaceId};
use vista_event::{EventBus, SubscriberId};

use crate::backend::{BackendKind, ContextBackend, ContextRequest, GraphicsContext};
use crate::error::{RenderError, SurfaceError};
use crate::frame::{FrameContext, RenderCallback, SurfaceInfo};
use crate::input::InputEvent;
use crate::scheduler::{FrameScheduler, TaskHandle};
use crate::stats::{is_sample_frame, RenderStatistics};
use crate::timing::{frame_delay, FrameTiming};

/// Surface lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceState {
    Uninitialized,
    Initializing,
    Ready,
    RenderingLoop,
    Error,
}

/// Surface configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Logical width
    pub width: u32,
    /// Logical height
    pub height: u32,
    /// Physical pixels per logical pixel
    pub pixel_ratio: f32,
    /// Clear color applied before every frame
    pub background: Color,
    pub msaa_samples: u32,
    pub vsync: bool,
    /// Frame-rate cap, 0 = unlimited
    pub max_fps: u32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            pixel_ratio: 1.0,
            background: Color::DARK_GREY,
            msaa_samples: 4,
            vsync: true,
            max_fps: 0,
        }
    }
}

impl SurfaceConfig {
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_max_fps(mut self, max_fps: u32) -> Self {
        self.max_fps = max_fps;
        self
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    /// Backing buffer size in physical pixels
    pub fn physical_size(&self) -> (u32, u32) {
        let ratio = if self.pixel_ratio > 0.0 {
            self.pixel_ratio
        } else {
            1.0
        };
        (
            (self.width as f32 * ratio).round() as u32,
            (self.height as f32 * ratio).round() as u32,
        )
    }

    fn context_request(&self) -> ContextRequest {
        let (width, height) = self.physical_size();
        ContextRequest {
            width,
            height,
            msaa_samples: self.msaa_samples,
            vsync: self.vsync,
        }
    }
}

/// Notifications published by a surface
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    StateChanged {
        from: SurfaceState,
        to: SurfaceState,
    },
    Error(SurfaceError),
    StatsUpdated(RenderStatistics),
    Resized {
        width: u32,
        height: u32,
    },
}

struct SurfaceInner {
    state: SurfaceState,
    config: SurfaceConfig,
    backend: Option<BackendKind>,
    context: Option<Box<dyn GraphicsContext>>,
    callback: Option<RenderCallback>,
    /// Bumped whenever the callback is set or cleared
    callback_seq: u64,
    timing: FrameTiming,
    stats: RenderStatistics,
    /// Outstanding frame request or throttle timer
    pending: Option<TaskHandle>,
    /// Bumped on stop/dispose; tasks from older generations do nothing
    generation: u64,
}

struct SurfaceShared {
    id: SurfaceId,
    scheduler: Arc<dyn FrameScheduler>,
    backends: Vec<Box<dyn ContextBackend>>,
    inner: Mutex<SurfaceInner>,
    events: EventBus<SurfaceEvent>,
    input: EventBus<InputEvent>,
}

/// Hardware rendering surface with its own frame loop
#[derive(Clone)]
pub struct RenderSurface {
    shared: Arc<SurfaceShared>,
}

impl RenderSurface {
    /// Create a surface; `backends` are tried in order by [`initialize`](Self::initialize)
    pub fn new(
        config: SurfaceConfig,
        backends: Vec<Box<dyn ContextBackend>>,
        scheduler: Arc<dyn FrameScheduler>,
    ) -> Self {
        let id = SurfaceId::next();
        log::debug!(
            "Creating surface {} ({}x{}, {} backends)",
            id.raw(),
            config.width,
            config.height,
            backends.len()
        );

        Self {
            shared: Arc::new(SurfaceShared {
                id,
                scheduler,
                backends,
                inner: Mutex::new(SurfaceInner {
                    state: SurfaceState::Uninitialized,
                    config,
                    backend: None,
                    context: None,
                    callback: None,
                    callback_seq: 0,
                    timing: FrameTiming::new(),
                    stats: RenderStatistics::new(),
                    pending: None,
                    generation: 0,
                }),
                events: EventBus::new(),
                input: EventBus::new(),
            }),
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.shared.id
    }

    pub fn state(&self) -> SurfaceState {
        self.shared.inner.lock().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == SurfaceState::RenderingLoop
    }

    pub fn config(&self) -> SurfaceConfig {
        self.shared.inner.lock().config.clone()
    }

    /// Logical size
    pub fn size(&self) -> (u32, u32) {
        let inner = self.shared.inner.lock();
        (inner.config.width, inner.config.height)
    }

    /// Backend that produced the current context
    pub fn backend(&self) -> Option<BackendKind> {
        self.shared.inner.lock().backend
    }

    /// Frames rendered since initialization
    pub fn frame_count(&self) -> u64 {
        self.shared.inner.lock().timing.frame_count()
    }

    /// Statistics of the most recent frame
    pub fn stats(&self) -> RenderStatistics {
        self.shared.inner.lock().stats.clone()
    }

    /// Acquire a graphics context, trying each backend in order.
    ///
    /// A backend answering `Ok(None)` is skipped; an acquisition error puts
    /// the surface into [`SurfaceState::Error`] without trying the rest.
    pub async fn initialize(&self) -> Result<BackendKind, SurfaceError> {
        let request = {
            let inner = self.shared.inner.lock();
            if inner.state != SurfaceState::Uninitialized {
                return Err(SurfaceError::InvalidState {
                    actual: inner.state,
                    expected: "Uninitialized",
                });
            }
            inner.config.context_request()
        };
        self.shared.transition(SurfaceState::Initializing);

        let mut tried = Vec::with_capacity(self.shared.backends.len());
        for backend in &self.shared.backends {
            log::debug!(
                "Surface {} requesting context from {}",
                self.shared.id.raw(),
                backend.name()
            );

            match backend.acquire(&request).await {
                Ok(Some(context)) => return self.install_context(backend.kind(), context),
                Ok(None) => {
                    log::warn!(
                        "Surface {}: backend {} unavailable, falling back",
                        self.shared.id.raw(),
                        backend.name()
                    );
                    tried.push(backend.name().to_string());
                }
                Err(err) => return Err(self.shared.fail(err)),
            }
        }

        Err(self
            .shared
            .fail(SurfaceError::NoBackendAvailable(tried.join(", "))))
    }

    fn install_context(
        &self,
        kind: BackendKind,
        context: Box<dyn GraphicsContext>,
    ) -> Result<BackendKind, SurfaceError> {
        {
            let mut inner = self.shared.inner.lock();
            if inner.state != SurfaceState::Initializing {
                // Disposed while the acquisition was in flight
                return Err(SurfaceError::Disposed);
            }
            inner.context = Some(context);
            inner.backend = Some(kind);
        }

        log::info!("Surface {} ready on {} backend", self.shared.id.raw(), kind);
        self.shared.transition(SurfaceState::Ready);
        Ok(kind)
    }

    /// Change the logical size; returns false when it is unchanged
    pub fn resize(&self, width: u32, height: u32) -> bool {
        {
            let mut inner = self.shared.inner.lock();
            if inner.config.width == width && inner.config.height == height {
                return false;
            }
            inner.config.width = width;
            inner.config.height = height;
            let (physical_width, physical_height) = inner.config.physical_size();
            if let Some(context) = inner.context.as_mut() {
                context.resize_buffer(physical_width, physical_height);
            }
        }

        log::debug!("Surface {} resized to {}x{}", self.shared.id.raw(), width, height);
        self.shared
            .events
            .publish(&SurfaceEvent::Resized { width, height });
        true
    }

    /// Set the frame-rate cap, applied from the next scheduled frame
    pub fn set_max_fps(&self, max_fps: u32) {
        self.shared.inner.lock().config.max_fps = max_fps;
    }

    pub fn set_background(&self, background: Color) {
        self.shared.inner.lock().config.background = background;
    }

    /// Install the per-frame draw function, replacing any previous one
    pub fn set_render_callback<F>(&self, callback: F)
    where
        F: FnMut(&mut FrameContext<'_>) -> Result<(), RenderError> + Send + 'static,
    {
        let mut inner = self.shared.inner.lock();
        inner.callback = Some(Box::new(callback));
        inner.callback_seq += 1;
    }

    pub fn clear_render_callback(&self) {
        let mut inner = self.shared.inner.lock();
        inner.callback = None;
        inner.callback_seq += 1;
    }

    /// Begin the frame loop. Starting a running surface is a no-op.
    pub fn start(&self) -> Result<(), SurfaceError> {
        {
            let mut inner = self.shared.inner.lock();
            match inner.state {
                SurfaceState::RenderingLoop => return Ok(()),
                SurfaceState::Ready => {}
                actual => {
                    return Err(SurfaceError::InvalidState {
                        actual,
                        expected: "Ready",
                    })
                }
            }

            inner.generation += 1;
            inner.timing.pause();
            inner.state = SurfaceState::RenderingLoop;
            let generation = inner.generation;
            inner.pending = Some(SurfaceShared::request_tick(&self.shared, generation));
        }

        log::info!("Surface {} render loop started", self.shared.id.raw());
        self.shared.publish_state(SurfaceState::Ready, SurfaceState::RenderingLoop);
        Ok(())
    }

    /// Stop the frame loop, cancelling any pending frame or throttle timer
    pub fn stop(&self) {
        {
            let mut inner = self.shared.inner.lock();
            if inner.state != SurfaceState::RenderingLoop {
                return;
            }
            self.shared.cancel_pending(&mut inner);
            inner.timing.pause();
            inner.state = SurfaceState::Ready;
        }

        log::info!("Surface {} render loop stopped", self.shared.id.raw());
        self.shared.publish_state(SurfaceState::RenderingLoop, SurfaceState::Ready);
    }

    /// Stop, drop the context and callback, and return to `Uninitialized`
    pub fn dispose(&self) {
        self.stop();

        let from = {
            let mut inner = self.shared.inner.lock();
            self.shared.cancel_pending(&mut inner);
            inner.context = None;
            inner.backend = None;
            inner.callback = None;
            inner.callback_seq += 1;
            inner.timing.reset();
            inner.stats = RenderStatistics::new();
            std::mem::replace(&mut inner.state, SurfaceState::Uninitialized)
        };

        if from != SurfaceState::Uninitialized {
            log::info!("Surface {} disposed", self.shared.id.raw());
            self.shared.publish_state(from, SurfaceState::Uninitialized);
        }
    }

    /// Run `f` against the current graphics context, if any
    pub fn with_context<R>(&self, f: impl FnOnce(&mut dyn GraphicsContext) -> R) -> Option<R> {
        let mut inner = self.shared.inner.lock();
        inner.context.as_mut().map(|context| f(context.as_mut()))
    }

    /// Republish a raw host input event to input subscribers
    pub fn dispatch_input(&self, event: InputEvent) {
        self.shared.input.publish(&event);
    }

    /// Bus carrying raw input events
    pub fn input_events(&self) -> &EventBus<InputEvent> {
        &self.shared.input
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriberId
    where
        F: Fn(&SurfaceEvent) + Send + Sync + 'static,
    {
        self.shared.events.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.shared.events.unsubscribe(id)
    }
}

impl std::fmt::Debug for RenderSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.shared.inner.lock();
        f.debug_struct("RenderSurface")
            .field("id", &self.shared.id)
            .field("state", &inner.state)
            .field("backend", &inner.backend)
            .field("size", &(inner.config.width, inner.config.height))
            .finish()
    }
}

impl SurfaceShared {
    fn transition(&self, to: SurfaceState) {
        let from = std::mem::replace(&mut self.inner.lock().state, to);
        if from != to {
            self.publish_state(from, to);
        }
    }

    fn publish_state(&self, from: SurfaceState, to: SurfaceState) {
        log::debug!("Surface {} state {:?} -> {:?}", self.id.raw(), from, to);
        self.events.publish(&SurfaceEvent::StateChanged { from, to });
    }

    /// Enter the error state (unless disposed meanwhile) and publish `err`
    fn fail(&self, err: SurfaceError) -> SurfaceError {
        log::error!("Surface {} initialization failed: {}", self.id.raw(), err);

        let from = {
            let mut inner = self.inner.lock();
            if inner.state == SurfaceState::Initializing {
                inner.state = SurfaceState::Error;
                Some(SurfaceState::Initializing)
            } else {
                None
            }
        };
        if let Some(from) = from {
            self.publish_state(from, SurfaceState::Error);
        }

        self.events.publish(&SurfaceEvent::Error(err.clone()));
        err
    }

    fn cancel_pending(&self, inner: &mut SurfaceInner) {
        inner.generation += 1;
        if let Some(handle) = inner.pending.take() {
            self.scheduler.cancel(handle);
        }
    }

    fn request_tick(shared: &Arc<Self>, generation: u64) -> TaskHandle {
        let weak: Weak<Self> = Arc::downgrade(shared);
        shared.scheduler.request_frame(Box::new(move |timestamp| {
            if let Some(shared) = weak.upgrade() {
                Self::tick(&shared, generation, timestamp);
            }
        }))
    }

    fn request_throttled_tick(shared: &Arc<Self>, generation: u64, delay_ms: f64) -> TaskHandle {
        let weak: Weak<Self> = Arc::downgrade(shared);
        shared.scheduler.request_timeout(
            delay_ms,
            Box::new(move |_| {
                if let Some(shared) = weak.upgrade() {
                    let mut inner = shared.inner.lock();
                    if inner.generation == generation && inner.state == SurfaceState::RenderingLoop {
                        inner.pending = Some(Self::request_tick(&shared, generation));
                    }
                }
            }),
        )
    }

    fn tick(shared: &Arc<Self>, generation: u64, timestamp: f64) {
        // Take the context and callback out so the callback may call back
        // into the surface without deadlocking
        let (mut context, mut callback, callback_seq, mut stats, info, width, height, delta_time, frame_count, background) = {
            let mut inner = shared.inner.lock();
            if inner.generation != generation || inner.state != SurfaceState::RenderingLoop {
                return;
            }
            inner.pending = None;

            let Some(context) = inner.context.take() else {
                log::warn!("Surface {} is running without a context", shared.id.raw());
                return;
            };
            let delta_time = inner.timing.begin_frame(timestamp);
            let mut stats = std::mem::take(&mut inner.stats);
            stats.reset_counts();

            let info = SurfaceInfo {
                id: shared.id,
                backend: context.backend(),
                pixel_ratio: inner.config.pixel_ratio,
            };

            (
                context,
                inner.callback.take(),
                inner.callback_seq,
                stats,
                info,
                inner.config.width,
                inner.config.height,
                delta_time,
                inner.timing.frame_count(),
                inner.config.background,
            )
        };

        context.clear(background);

        let started = Instant::now();
        let result = match callback.as_mut() {
            Some(callback) => {
                let mut frame = FrameContext {
                    surface: info,
                    context: context.as_mut(),
                    width,
                    height,
                    delta_time,
                    timestamp,
                    frame_count,
                    stats: &mut stats,
                };
                callback(&mut frame)
            }
            None => Ok(()),
        };
        let frame_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        stats.cpu_time = frame_time_ms as f32;

        let sample = {
            let mut inner = shared.inner.lock();

            let sample = if is_sample_frame(frame_count) {
                stats.fps = inner.timing.average_fps() as f32;
                stats.frame_time = inner.timing.average_frame_time() as f32;
                Some(stats.clone())
            } else {
                None
            };
            inner.stats = stats;

            if matches!(inner.state, SurfaceState::Ready | SurfaceState::RenderingLoop) {
                // Catch up with any resize made while the context was out
                let physical = inner.config.physical_size();
                if context.buffer_size() != physical {
                    context.resize_buffer(physical.0, physical.1);
                }
                inner.context = Some(context);
            }
            // A callback set or cleared during the frame wins
            if inner.callback_seq == callback_seq {
                inner.callback = callback;
            }

            if inner.generation == generation && inner.state == SurfaceState::RenderingLoop {
                inner.pending = Some(match frame_delay(inner.config.max_fps, frame_time_ms) {
                    Some(delay) => Self::request_throttled_tick(shared, generation, delay),
                    None => Self::request_tick(shared, generation),
                });
            }
            sample
        };

        if let Err(source) = result {
            log::error!(
                "Surface {} render callback failed on frame {}: {}",
                shared.id.raw(),
                frame_count,
                source
            );
            shared.events.publish(&SurfaceEvent::Error(SurfaceError::Callback {
                frame: frame_count,
                source,
            }));
        }

        if let Some(stats) = sample {
            shared.events.publish(&SurfaceEvent::StatsUpdated(stats));
        }
    }
}
