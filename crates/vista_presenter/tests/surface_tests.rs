//! Render surface integration tests, driven by a manual host scheduler

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use glam::Vec2;
use parking_lot::Mutex;
use vista_core::Color;
use vista_presenter::prelude::*;
use vista_presenter::{HeadlessContext, STATS_SAMPLE_INTERVAL};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn ready_surface(scheduler: &Arc<HostScheduler>, config: SurfaceConfig) -> RenderSurface {
    let surface = RenderSurface::new(
        config,
        vec![Box::new(HeadlessBackend::software())],
        scheduler.clone(),
    );
    pollster::block_on(surface.initialize()).unwrap();
    surface
}

fn collect_events(surface: &RenderSurface) -> Arc<Mutex<Vec<SurfaceEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    surface.subscribe(move |event| sink.lock().push(event.clone()));
    events
}

#[test]
fn falls_back_to_next_available_backend() {
    init_logging();
    let scheduler = Arc::new(HostScheduler::manual());
    let surface = RenderSurface::new(
        SurfaceConfig::default(),
        vec![
            Box::new(HeadlessBackend::unavailable(BackendKind::HighPerformance)),
            Box::new(HeadlessBackend::new(BackendKind::Compatibility)),
        ],
        scheduler,
    );
    let events = collect_events(&surface);

    let backend = pollster::block_on(surface.initialize()).unwrap();
    assert_eq!(backend, BackendKind::Compatibility);
    assert_eq!(surface.state(), SurfaceState::Ready);
    assert_eq!(surface.backend(), Some(BackendKind::Compatibility));

    let states: Vec<_> = events
        .lock()
        .iter()
        .filter_map(|e| match e {
            SurfaceEvent::StateChanged { to, .. } => Some(*to),
            _ => None,
        })
        .collect();
    assert_eq!(states, vec![SurfaceState::Initializing, SurfaceState::Ready]);
}

#[test]
fn no_available_backend_is_an_error() {
    init_logging();
    let surface = RenderSurface::new(
        SurfaceConfig::default(),
        vec![
            Box::new(HeadlessBackend::unavailable(BackendKind::HighPerformance)),
            Box::new(HeadlessBackend::unavailable(BackendKind::Compatibility)),
        ],
        Arc::new(HostScheduler::manual()),
    );
    let events = collect_events(&surface);

    let err = pollster::block_on(surface.initialize()).unwrap_err();
    assert!(matches!(err, SurfaceError::NoBackendAvailable(_)));
    assert_eq!(surface.state(), SurfaceState::Error);
    assert!(events
        .lock()
        .iter()
        .any(|e| matches!(e, SurfaceEvent::Error(SurfaceError::NoBackendAvailable(_)))));
    assert!(surface.start().is_err());
}

#[test]
fn acquisition_failure_stops_the_fallback_chain() {
    init_logging();
    let surface = RenderSurface::new(
        SurfaceConfig::default(),
        vec![
            Box::new(HeadlessBackend::failing(BackendKind::HighPerformance, "lost device")),
            Box::new(HeadlessBackend::software()),
        ],
        Arc::new(HostScheduler::manual()),
    );

    let err = pollster::block_on(surface.initialize()).unwrap_err();
    assert!(matches!(err, SurfaceError::AcquisitionFailed { .. }));
    assert_eq!(surface.state(), SurfaceState::Error);
    assert_eq!(surface.backend(), None);
}

#[test]
fn callback_runs_once_per_tick_with_increasing_frames() {
    init_logging();
    let scheduler = Arc::new(HostScheduler::manual());
    let surface = ready_surface(&scheduler, SurfaceConfig::default().with_size(800, 600));

    let frames = Arc::new(Mutex::new(Vec::new()));
    let sink = frames.clone();
    surface.set_render_callback(move |frame| {
        assert_eq!((frame.width, frame.height), (800, 600));
        sink.lock().push((frame.frame_count, frame.delta_time));
        Ok(())
    });

    surface.start().unwrap();
    scheduler.run_frames(5, 16.0);

    let frames = frames.lock();
    assert_eq!(frames.len(), 5);
    assert_eq!(frames[0], (1, 0.0));
    for pair in frames.windows(2) {
        assert!(pair[1].0 > pair[0].0);
        assert_eq!(pair[1].1, 16.0);
    }
}

#[test]
fn frames_are_cleared_with_the_background_color() {
    let scheduler = Arc::new(HostScheduler::manual());
    let surface = ready_surface(
        &scheduler,
        SurfaceConfig::default().with_background(Color::BLUE),
    );
    surface.start().unwrap();
    scheduler.run_frames(3, 16.0);

    let (clears, color) = surface
        .with_context(|context| {
            let headless = context
                .as_any_mut()
                .downcast_mut::<HeadlessContext>()
                .unwrap();
            (headless.clear_count(), headless.last_clear())
        })
        .unwrap();
    assert_eq!(clears, 3);
    assert_eq!(color, Some(Color::BLUE));
}

#[test]
fn callback_error_is_reported_and_loop_continues() {
    init_logging();
    let scheduler = Arc::new(HostScheduler::manual());
    let surface = ready_surface(&scheduler, SurfaceConfig::default());
    let events = collect_events(&surface);

    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    surface.set_render_callback(move |frame| {
        counter.fetch_add(1, Ordering::SeqCst);
        if frame.frame_count == 3 {
            Err(RenderError::Pipeline("bad shader".into()))
        } else {
            Ok(())
        }
    });

    surface.start().unwrap();
    scheduler.run_frames(4, 16.0);

    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(surface.state(), SurfaceState::RenderingLoop);

    let errors: Vec<_> = events
        .lock()
        .iter()
        .filter_map(|e| match e {
            SurfaceEvent::Error(err) => Some(err.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(
        errors,
        vec![SurfaceError::Callback {
            frame: 3,
            source: RenderError::Pipeline("bad shader".into()),
        }]
    );
}

#[test]
fn stop_cancels_pending_frame() {
    let scheduler = Arc::new(HostScheduler::manual());
    let surface = ready_surface(&scheduler, SurfaceConfig::default());

    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    surface.set_render_callback(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    surface.start().unwrap();
    // Starting twice is a no-op
    surface.start().unwrap();
    scheduler.run_frames(2, 16.0);
    assert_eq!(scheduler.pending_frames(), 1);

    surface.stop();
    assert_eq!(surface.state(), SurfaceState::Ready);
    assert_eq!(scheduler.pending_frames(), 0);

    scheduler.run_frames(5, 16.0);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn stop_from_inside_the_callback() {
    let scheduler = Arc::new(HostScheduler::manual());
    let surface = ready_surface(&scheduler, SurfaceConfig::default());

    let handle = surface.clone();
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    surface.set_render_callback(move |frame| {
        counter.fetch_add(1, Ordering::SeqCst);
        if frame.frame_count == 2 {
            handle.stop();
        }
        Ok(())
    });

    surface.start().unwrap();
    scheduler.run_frames(5, 16.0);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(surface.state(), SurfaceState::Ready);
    assert_eq!(scheduler.pending_frames(), 0);
}

#[test]
fn frame_rate_cap_throttles_ticks() {
    let scheduler = Arc::new(HostScheduler::manual());
    let surface = ready_surface(&scheduler, SurfaceConfig::default().with_max_fps(10));

    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    surface.set_render_callback(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    surface.start().unwrap();
    // 100 host frames at ~60Hz over 1.6s; a 10fps cap allows about 16
    scheduler.run_frames(100, 16.0);

    let rendered = calls.load(Ordering::SeqCst);
    assert!((10..=20).contains(&rendered), "rendered {} frames", rendered);

    surface.stop();
    assert_eq!(scheduler.pending_timeouts() + scheduler.pending_frames(), 0);
}

#[test]
fn stats_are_sampled_every_interval() {
    let scheduler = Arc::new(HostScheduler::manual());
    let surface = ready_surface(&scheduler, SurfaceConfig::default());
    let events = collect_events(&surface);

    surface.set_render_callback(|frame| {
        frame.record_draw(36, 12);
        Ok(())
    });

    surface.start().unwrap();
    scheduler.run_frames(2 * STATS_SAMPLE_INTERVAL as usize + 10, 20.0);

    let samples: Vec<RenderStatistics> = events
        .lock()
        .iter()
        .filter_map(|e| match e {
            SurfaceEvent::StatsUpdated(stats) => Some(stats.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(samples.len(), 2);
    assert!((samples[0].fps - 50.0).abs() < 0.01);
    assert!((samples[0].frame_time - 20.0).abs() < 0.01);
    assert_eq!(samples[0].draw_calls, 1);
    assert_eq!(samples[0].triangles, 12);
}

#[test]
fn input_events_are_republished() {
    let surface = RenderSurface::new(
        SurfaceConfig::default(),
        vec![Box::new(HeadlessBackend::software())],
        Arc::new(HostScheduler::manual()),
    );

    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    let id = surface
        .input_events()
        .subscribe(move |event: &InputEvent| sink.lock().push(event.clone()));

    let down = InputEvent::PointerDown(PointerEvent::new(
        1,
        PointerButton::Left,
        Vec2::new(10.0, 20.0),
    ));
    surface.dispatch_input(down.clone());
    surface.dispatch_input(InputEvent::Wheel(WheelEvent::vertical(-3.0)));

    assert!(surface.input_events().unsubscribe(id));
    surface.dispatch_input(down.clone());

    let received = received.lock();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0], down);
}

#[test]
fn resize_publishes_once_per_change() {
    let scheduler = Arc::new(HostScheduler::manual());
    let surface = ready_surface(&scheduler, SurfaceConfig::default());
    let events = collect_events(&surface);

    assert!(surface.resize(1024, 768));
    assert!(!surface.resize(1024, 768));

    let resized: Vec<_> = events
        .lock()
        .iter()
        .filter(|e| matches!(e, SurfaceEvent::Resized { .. }))
        .cloned()
        .collect();
    assert_eq!(
        resized,
        vec![SurfaceEvent::Resized {
            width: 1024,
            height: 768
        }]
    );
}

#[test]
fn dispose_allows_reinitialization() {
    let scheduler = Arc::new(HostScheduler::manual());
    let surface = ready_surface(&scheduler, SurfaceConfig::default());
    surface.start().unwrap();
    scheduler.run_frames(3, 16.0);

    surface.dispose();
    assert_eq!(surface.state(), SurfaceState::Uninitialized);
    assert_eq!(surface.frame_count(), 0);

    pollster::block_on(surface.initialize()).unwrap();
    assert_eq!(surface.state(), SurfaceState::Ready);
}

#[test]
fn resize_from_inside_the_callback_reaches_the_buffer() {
    let scheduler = Arc::new(HostScheduler::manual());
    let surface = ready_surface(&scheduler, SurfaceConfig::default().with_size(320, 240));

    let handle = surface.clone();
    let sizes = Arc::new(Mutex::new(Vec::new()));
    let sink = sizes.clone();
    surface.set_render_callback(move |frame| {
        sink.lock().push((frame.width, frame.height));
        if frame.frame_count == 1 {
            assert!(handle.resize(640, 480));
        }
        Ok(())
    });

    surface.start().unwrap();
    scheduler.run_frames(3, 16.0);

    assert_eq!(surface.size(), (640, 480));
    assert_eq!(surface.with_context(|c| c.buffer_size()), Some((640, 480)));
    assert!(!surface.resize(640, 480));
    assert_eq!(*sizes.lock(), vec![(320, 240), (640, 480), (640, 480)]);
}

#[test]
fn clearing_the_callback_mid_frame_sticks() {
    let scheduler = Arc::new(HostScheduler::manual());
    let surface = ready_surface(&scheduler, SurfaceConfig::default());

    let handle = surface.clone();
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    surface.set_render_callback(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        handle.clear_render_callback();
        Ok(())
    });

    surface.start().unwrap();
    scheduler.run_frames(4, 16.0);

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(surface.state(), SurfaceState::RenderingLoop);
}

#[test]
fn replacing_the_callback_mid_frame_wins() {
    let scheduler = Arc::new(HostScheduler::manual());
    let surface = ready_surface(&scheduler, SurfaceConfig::default());

    let handle = surface.clone();
    let replaced = Arc::new(AtomicU32::new(0));
    let counter = replaced.clone();
    surface.set_render_callback(move |_| {
        let counter = counter.clone();
        handle.set_render_callback(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        Ok(())
    });

    surface.start().unwrap();
    scheduler.run_frames(3, 16.0);
    assert_eq!(replaced.load(Ordering::SeqCst), 2);
}
