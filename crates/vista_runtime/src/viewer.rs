//! Viewer - wires the registry, a render surface, and a camera controller
//! to one host scheduler.

use std::sync::Arc;

use glam::Vec2;
use thiserror::Error;
use vista_event::EventChannel;
use vista_math::CameraState;
use vista_presenter::{
    BackendKind, HeadlessBackend, HostScheduler, InputEvent, PointerButton, PointerEvent,
    RenderError, RenderStatistics, RenderSurface, SurfaceError, SurfaceEvent, WheelEvent,
};
use vista_viewport::{
    calculate_grid_lines, coordinate_panel, fps_panel, render_overlays, snap_to_grid,
    stats_panel, CameraController, ControllerEvent, OverlayElement, OverlayKind, OverlayPoint,
    RegistryEvent, ViewerSettings, ViewportConfigPatch, ViewportFrame, ViewportRegistry,
};

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),

    #[error("Registry has no active viewport")]
    NoActiveViewport,

    #[error(transparent)]
    Registry(#[from] vista_viewport::RegistryError),

    #[error("Failed to write {path:?}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}

/// Everything the viewer hears about, in arrival order
#[derive(Clone, Debug)]
pub enum ViewerEvent {
    Registry(RegistryEvent),
    Surface(SurfaceEvent),
    Controller(ControllerEvent),
}

/// Headless multi-viewport viewer
pub struct Viewer {
    scheduler: Arc<HostScheduler>,
    registry: ViewportRegistry,
    surface: RenderSurface,
    controller: CameraController,
    events: Arc<EventChannel<ViewerEvent>>,
    settings: ViewerSettings,
    clock: f64,
    status: Vec<String>,
}

impl Viewer {
    /// Build the viewer and acquire a rendering context
    pub fn new(settings: ViewerSettings, viewports: usize) -> Result<Self, ViewerError> {
        log::info!("Creating Vista viewer...");

        let scheduler = Arc::new(HostScheduler::manual());
        let registry = ViewportRegistry::with_container_size(
            scheduler.clone(),
            settings.viewport.width,
            settings.viewport.height,
        );
        registry.set_layout(settings.layout);
        let defaults = ViewportConfigPatch::from(&settings.viewport);
        for _ in 0..viewports.max(1) {
            registry.add_viewport(Some(defaults.clone()));
        }

        let surface = RenderSurface::new(
            settings.viewport.surface_config(),
            vec![
                Box::new(HeadlessBackend::unavailable(BackendKind::HighPerformance)),
                Box::new(HeadlessBackend::software()),
            ],
            scheduler.clone(),
        );

        let events = Arc::new(EventChannel::with_capacity(4096));
        let sink = events.clone();
        registry.subscribe(move |e| sink.send(ViewerEvent::Registry(e.clone())));
        let sink = events.clone();
        surface.subscribe(move |e| sink.send(ViewerEvent::Surface(e.clone())));

        let backend = pollster::block_on(surface.initialize())?;
        log::info!("Surface ready on {} backend", backend);

        let active = registry.active_viewport().ok_or(ViewerError::NoActiveViewport)?;
        let controller = CameraController::new(registry.clone(), active, settings.controls.clone());
        let sink = events.clone();
        controller.subscribe(move |e| sink.send(ViewerEvent::Controller(e.clone())));
        controller.attach(&surface);

        Ok(Self {
            scheduler,
            registry,
            surface,
            controller,
            events,
            settings,
            clock: 0.0,
            status: Vec::new(),
        })
    }

    pub fn registry(&self) -> &ViewportRegistry {
        &self.registry
    }

    pub fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    /// Install per-viewport callbacks and start both loops
    pub fn start(&self) -> Result<(), ViewerError> {
        for id in self.registry.viewport_ids() {
            let grid = self.settings.grid.clone();
            let snap = self.settings.snap.clone();
            self.registry.register_render_callback(id, move |frame: &ViewportFrame| {
                let lines = calculate_grid_lines(&frame.camera, frame.size, &grid);
                let origin = OverlayElement::new(
                    "origin",
                    OverlayKind::Text {
                        position: OverlayPoint::World(snap_to_grid(frame.camera.target, &snap)),
                        text: "origin".into(),
                        color: grid.x_axis_color,
                        font_size: 12.0,
                    },
                );
                let overlays = render_overlays(&[origin], &frame.camera, frame.size);
                log::trace!(
                    "{} frame {}: {} grid lines, {} overlays",
                    frame.viewport,
                    frame.frame,
                    lines.line_count(),
                    overlays.len()
                );
                Ok(())
            });
        }

        self.surface.set_render_callback(|ctx| {
            if ctx.width == 0 || ctx.height == 0 {
                return Err(RenderError::Message("zero-sized frame".into()));
            }
            ctx.record_draw(4, 2);
            Ok(())
        });

        self.registry.start_render_loop();
        self.surface.start()?;
        Ok(())
    }

    /// Write the registry snapshot as JSON
    pub fn export_snapshot(&self, path: &std::path::Path) -> Result<(), ViewerError> {
        let json = self.registry.export_json()?;
        std::fs::write(path, json).map_err(|source| ViewerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Wrote registry snapshot to {}", path.display());
        Ok(())
    }

    /// Run `frames` host frames, `interval_ms` apart
    pub fn run(&mut self, frames: usize, interval_ms: f64) {
        for frame in 0..frames {
            self.clock += interval_ms;
            self.scripted_input(frame);
            self.scheduler.run_frame(self.clock);
            self.drain_events();
        }
    }

    /// A short orbit drag, then a zoom, to exercise the controller
    fn scripted_input(&self, frame: usize) {
        let pointer = |x: f32, y: f32| PointerEvent::new(1, PointerButton::Left, Vec2::new(x, y));
        let event = match frame {
            10 => InputEvent::PointerDown(pointer(400.0, 300.0)),
            11..=30 => InputEvent::PointerMove(pointer(400.0 + (frame - 10) as f32 * 4.0, 300.0)),
            31 => InputEvent::PointerUp(pointer(480.0, 300.0)),
            90 => InputEvent::Wheel(WheelEvent::vertical(-120.0)),
            _ => return,
        };
        self.surface.dispatch_input(event);
    }

    fn drain_events(&mut self) {
        for event in self.events.drain() {
            match event {
                ViewerEvent::Surface(SurfaceEvent::StatsUpdated(stats)) => {
                    self.status = self.status_lines(&stats);
                    for line in &self.status {
                        log::info!("{}", line);
                    }
                }
                ViewerEvent::Surface(SurfaceEvent::Error(e)) => log::error!("Surface error: {}", e),
                ViewerEvent::Registry(RegistryEvent::CameraChanged { .. }) => {}
                ViewerEvent::Registry(RegistryEvent::RenderComplete { .. }) => {}
                ViewerEvent::Registry(RegistryEvent::RenderFailed { id, frame, error }) => {
                    log::warn!("{} skipped frame {}: {}", id, frame, error)
                }
                other => log::debug!("{:?}", other),
            }
        }
    }

    fn status_lines(&self, stats: &RenderStatistics) -> Vec<String> {
        let rows = if self.settings.show_stats {
            stats_panel(stats)
        } else {
            fps_panel(stats)
        };
        let mut lines: Vec<String> = rows.iter().map(|r| format!("{}: {}", r.label, r.value)).collect();

        if let Some(camera) = self.active_camera() {
            let snapped = self.settings.snap.grid_snap.then(|| snap_to_grid(camera.target, &self.settings.snap));
            lines.extend(
                coordinate_panel(camera.target, snapped)
                    .iter()
                    .map(|r| format!("Target {}: {}", r.label, r.value)),
            );
        }
        lines
    }

    fn active_camera(&self) -> Option<CameraState> {
        self.registry.active_viewport().and_then(|id| self.registry.camera(id))
    }

    /// Status lines from the last statistics sample
    pub fn status_text(&self) -> Vec<String> {
        self.status.clone()
    }

    /// Stop loops and release the context
    pub fn shutdown(&self) {
        log::info!("Shutting down viewer...");
        self.controller.dispose();
        self.registry.stop_render_loop();
        self.surface.dispose();
    }
}
