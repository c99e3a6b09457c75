//! Frame timing and pacing
//!
//! Timestamps come from the scheduler in milliseconds, so the same code runs
//! against a real monotonic clock and a manually advanced test clock.

use std::collections::VecDeque;

/// Frames kept for averaging
const HISTORY_SIZE: usize = 120;

/// Frame timing information
#[derive(Debug, Clone)]
pub struct FrameTiming {
    /// Timestamp of the previous frame (ms)
    last_timestamp: Option<f64>,
    /// Last frame delta (ms)
    last_delta: f64,
    /// Frame delta history for averaging
    frame_times: VecDeque<f64>,
    /// Total elapsed time (ms)
    total_elapsed: f64,
    /// Frame count
    frame_count: u64,
}

impl FrameTiming {
    pub fn new() -> Self {
        Self {
            last_timestamp: None,
            last_delta: 0.0,
            frame_times: VecDeque::with_capacity(HISTORY_SIZE),
            total_elapsed: 0.0,
            frame_count: 0,
        }
    }

    /// Mark a frame at `timestamp` and return its delta time in ms.
    ///
    /// The first frame (and the first after [`FrameTiming::pause`]) has a
    /// delta of zero. Timestamps going backwards also yield zero.
    pub fn begin_frame(&mut self, timestamp: f64) -> f64 {
        let delta = match self.last_timestamp {
            Some(last) => (timestamp - last).max(0.0),
            None => 0.0,
        };

        if self.last_timestamp.is_some() {
            self.total_elapsed += delta;
            if self.frame_times.len() >= HISTORY_SIZE {
                self.frame_times.pop_front();
            }
            self.frame_times.push_back(delta);
        }

        self.last_timestamp = Some(timestamp);
        self.last_delta = delta;
        self.frame_count += 1;
        delta
    }

    /// Forget the previous timestamp so the next frame starts with delta 0
    pub fn pause(&mut self) {
        self.last_timestamp = None;
    }

    /// Get last frame delta (ms)
    pub fn last_delta(&self) -> f64 {
        self.last_delta
    }

    /// Get average frame delta (ms)
    pub fn average_frame_time(&self) -> f64 {
        if self.frame_times.is_empty() {
            0.0
        } else {
            self.frame_times.iter().sum::<f64>() / self.frame_times.len() as f64
        }
    }

    /// Get average FPS
    pub fn average_fps(&self) -> f64 {
        let avg = self.average_frame_time();
        if avg > 0.0 {
            1000.0 / avg
        } else {
            0.0
        }
    }

    /// Get total elapsed time (ms)
    pub fn total_elapsed(&self) -> f64 {
        self.total_elapsed
    }

    /// Get total frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Reset timing
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self::new()
    }
}

/// Delay before requesting the next frame under a frame-rate cap.
///
/// `None` when uncapped (`max_fps == 0`): request the next frame right away.
/// Otherwise `max(0, 1000 / max_fps - frame_time_ms)`.
pub fn frame_delay(max_fps: u32, frame_time_ms: f64) -> Option<f64> {
    if max_fps == 0 {
        None
    } else {
        Some((1000.0 / max_fps as f64 - frame_time_ms).max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_frame_has_zero_delta() {
        let mut timing = FrameTiming::new();
        assert_eq!(timing.begin_frame(1000.0), 0.0);
        assert_eq!(timing.begin_frame(1016.0), 16.0);
        assert_eq!(timing.begin_frame(1048.0), 32.0);
        assert_eq!(timing.frame_count(), 3);
        assert_eq!(timing.total_elapsed(), 48.0);
        assert_eq!(timing.average_frame_time(), 24.0);
    }

    #[test]
    fn test_pause_restarts_delta() {
        let mut timing = FrameTiming::new();
        timing.begin_frame(0.0);
        timing.begin_frame(16.0);
        timing.pause();
        assert_eq!(timing.begin_frame(5000.0), 0.0);
        assert_eq!(timing.frame_count(), 3);
    }

    #[test]
    fn test_backwards_timestamp_clamps() {
        let mut timing = FrameTiming::new();
        timing.begin_frame(100.0);
        assert_eq!(timing.begin_frame(90.0), 0.0);
    }

    #[test]
    fn test_average_fps() {
        let mut timing = FrameTiming::new();
        for i in 0..10 {
            timing.begin_frame(i as f64 * 20.0);
        }
        assert!((timing.average_fps() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_frame_delay() {
        assert_eq!(frame_delay(0, 5.0), None);
        assert_eq!(frame_delay(50, 5.0), Some(15.0));
        assert_eq!(frame_delay(50, 40.0), Some(0.0));
    }
}
