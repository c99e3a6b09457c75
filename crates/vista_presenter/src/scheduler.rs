//! Frame scheduling
//!
//! Render and damping loops never talk to a windowing system directly. They
//! ask a [`FrameScheduler`] for "run this on the next frame" or "run this
//! after a delay", and cancel outstanding requests when they stop.
//!
//! [`HostScheduler`] is the bundled implementation. The host calls
//! [`HostScheduler::run_frame`] from its redraw callback (winit
//! `RedrawRequested`, a browser animation frame, a test loop):
//!
//! ```text
//! host redraw ──► run_frame(ts) ──► due timeouts ──► queued frame tasks
//!                                                        │
//!                                     (tasks queued here run next frame)
//! ```

use std::time::Instant;

use parking_lot::Mutex;

/// Task run by the scheduler; receives the frame timestamp in milliseconds
pub type FrameTask = Box<dyn FnOnce(f64) + Send>;

/// Handle of a pending frame request or timeout
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

impl TaskHandle {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// "Request next tick / cancel tick" abstraction over the host frame callback
pub trait FrameScheduler: Send + Sync {
    /// Current time in milliseconds
    fn now(&self) -> f64;

    /// Run `task` on the next frame
    fn request_frame(&self, task: FrameTask) -> TaskHandle;

    /// Run `task` once `delay_ms` milliseconds have passed
    fn request_timeout(&self, delay_ms: f64, task: FrameTask) -> TaskHandle;

    /// Cancel a pending request; false if it already ran or never existed
    fn cancel(&self, handle: TaskHandle) -> bool;
}

enum Clock {
    /// Time only moves when the host passes a timestamp
    Manual,
    /// Wall-clock time since the scheduler was created
    Monotonic(Instant),
}

struct Timeout {
    handle: TaskHandle,
    due: f64,
    task: FrameTask,
}

struct HostState {
    now: f64,
    next_handle: u64,
    frames: Vec<(TaskHandle, FrameTask)>,
    timeouts: Vec<Timeout>,
    frames_run: u64,
}

/// Scheduler driven by the host's per-frame callback
pub struct HostScheduler {
    clock: Clock,
    state: Mutex<HostState>,
}

impl HostScheduler {
    /// Scheduler whose clock only advances through `run_frame`/`advance`
    pub fn manual() -> Self {
        Self::with_clock(Clock::Manual)
    }

    /// Scheduler whose `now` reads a monotonic wall clock
    pub fn monotonic() -> Self {
        Self::with_clock(Clock::Monotonic(Instant::now()))
    }

    fn with_clock(clock: Clock) -> Self {
        Self {
            clock,
            state: Mutex::new(HostState {
                now: 0.0,
                next_handle: 1,
                frames: Vec::new(),
                timeouts: Vec::new(),
                frames_run: 0,
            }),
        }
    }

    /// Run one frame at `timestamp` (ms).
    ///
    /// Fires every timeout due at `timestamp` (earliest first), then every
    /// frame task queued before this frame started, including ones queued by
    /// those timeouts. Returns the number of tasks run.
    pub fn run_frame(&self, timestamp: f64) -> usize {
        let due = {
            let mut state = self.state.lock();
            state.now = state.now.max(timestamp);

            let (mut due, pending): (Vec<Timeout>, Vec<Timeout>) = state
                .timeouts
                .drain(..)
                .partition(|t| t.due <= timestamp);
            state.timeouts = pending;
            due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.handle.0.cmp(&b.handle.0)));
            due
        };

        let mut ran = due.len();
        for timeout in due {
            (timeout.task)(timestamp);
        }

        let frames = {
            let mut state = self.state.lock();
            state.frames_run += 1;
            std::mem::take(&mut state.frames)
        };

        ran += frames.len();
        for (_, task) in frames {
            task(timestamp);
        }

        ran
    }

    /// Move the clock forward by `delta_ms` and run one frame
    pub fn advance(&self, delta_ms: f64) -> usize {
        let timestamp = self.state.lock().now + delta_ms.max(0.0);
        self.run_frame(timestamp)
    }

    /// Run `count` frames spaced `interval_ms` apart
    pub fn run_frames(&self, count: usize, interval_ms: f64) -> usize {
        (0..count).map(|_| self.advance(interval_ms)).sum()
    }

    /// Frame tasks waiting for the next frame
    pub fn pending_frames(&self) -> usize {
        self.state.lock().frames.len()
    }

    /// Timeouts not yet due
    pub fn pending_timeouts(&self) -> usize {
        self.state.lock().timeouts.len()
    }

    /// Frames run so far
    pub fn frames_run(&self) -> u64 {
        self.state.lock().frames_run
    }

    fn allocate(state: &mut HostState) -> TaskHandle {
        let handle = TaskHandle(state.next_handle);
        state.next_handle += 1;
        handle
    }
}

impl Default for HostScheduler {
    fn default() -> Self {
        Self::manual()
    }
}

impl FrameScheduler for HostScheduler {
    fn now(&self) -> f64 {
        match &self.clock {
            Clock::Manual => self.state.lock().now,
            Clock::Monotonic(start) => start.elapsed().as_secs_f64() * 1000.0,
        }
    }

    fn request_frame(&self, task: FrameTask) -> TaskHandle {
        let mut state = self.state.lock();
        let handle = Self::allocate(&mut state);
        state.frames.push((handle, task));
        handle
    }

    fn request_timeout(&self, delay_ms: f64, task: FrameTask) -> TaskHandle {
        let mut state = self.state.lock();
        let handle = Self::allocate(&mut state);
        let due = state.now + delay_ms.max(0.0);
        state.timeouts.push(Timeout { handle, due, task });
        handle
    }

    fn cancel(&self, handle: TaskHandle) -> bool {
        let mut state = self.state.lock();
        let before = state.frames.len() + state.timeouts.len();
        state.frames.retain(|(h, _)| *h != handle);
        state.timeouts.retain(|t| t.handle != handle);
        before != state.frames.len() + state.timeouts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_frame_task_runs_once() {
        let scheduler = HostScheduler::manual();
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        scheduler.request_frame(Box::new(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(scheduler.advance(16.0), 1);
        assert_eq!(scheduler.advance(16.0), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_task_queued_during_frame_runs_next_frame() {
        let scheduler = Arc::new(HostScheduler::manual());
        let counter = Arc::new(AtomicU32::new(0));

        let s = scheduler.clone();
        let c = counter.clone();
        scheduler.request_frame(Box::new(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            let c2 = c.clone();
            s.request_frame(Box::new(move |_| {
                c2.fetch_add(1, Ordering::SeqCst);
            }));
        }));

        scheduler.advance(16.0);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending_frames(), 1);
        scheduler.advance(16.0);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_timeout_fires_when_due() {
        let scheduler = HostScheduler::manual();
        let fired_at = Arc::new(parking_lot::Mutex::new(None));
        let f = fired_at.clone();

        scheduler.request_timeout(
            30.0,
            Box::new(move |ts| {
                *f.lock() = Some(ts);
            }),
        );

        scheduler.advance(16.0);
        assert!(fired_at.lock().is_none());
        scheduler.advance(16.0);
        assert_eq!(*fired_at.lock(), Some(32.0));
        assert_eq!(scheduler.pending_timeouts(), 0);
    }

    #[test]
    fn test_cancel() {
        let scheduler = HostScheduler::manual();
        let counter = Arc::new(AtomicU32::new(0));
        let c1 = counter.clone();
        let c2 = counter.clone();

        let frame = scheduler.request_frame(Box::new(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        }));
        let timeout = scheduler.request_timeout(
            5.0,
            Box::new(move |_| {
                c2.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert!(scheduler.cancel(frame));
        assert!(scheduler.cancel(timeout));
        assert!(!scheduler.cancel(frame));

        scheduler.advance(100.0);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_manual_clock_follows_frames() {
        let scheduler = HostScheduler::manual();
        assert_eq!(scheduler.now(), 0.0);
        scheduler.run_frame(120.0);
        assert_eq!(scheduler.now(), 120.0);
        // Never moves backwards
        scheduler.run_frame(50.0);
        assert_eq!(scheduler.now(), 120.0);
    }

    #[test]
    fn test_monotonic_clock_advances() {
        let scheduler = HostScheduler::monotonic();
        let a = scheduler.now();
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert!(scheduler.now() > a);
    }
}
