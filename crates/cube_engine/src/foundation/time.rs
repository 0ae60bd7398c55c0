//! Frame timing utilities

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Average-framerate counter with once-per-second reporting ticks
pub struct FrameCounter {
    start: Instant,
    last_report: Instant,
    frames: u64,
    fps: f64,
}

impl Default for FrameCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCounter {
    /// Create a counter starting now
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Create a counter with an explicit start time
    pub fn starting_at(start: Instant) -> Self {
        Self {
            start,
            last_report: start,
            frames: 0,
            fps: 0.0,
        }
    }

    /// Count one frame finished at `now`.
    ///
    /// Returns `true` when at least a second has passed since the last report.
    pub fn frame_at(&mut self, now: Instant) -> bool {
        self.frames = self.frames.wrapping_add(1);
        if self.frames == 0 {
            self.start = now;
        }

        let seconds = now.duration_since(self.start).as_secs_f64();
        if seconds > 0.0 {
            self.fps = self.frames as f64 / seconds;
        }

        if now.duration_since(self.last_report) >= Duration::from_secs(1) {
            self.last_report = now;
            true
        } else {
            false
        }
    }

    /// Count one frame finished now
    pub fn frame(&mut self) -> bool {
        self.frame_at(Instant::now())
    }

    /// Frames per second averaged since the start
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Frames counted so far
    pub fn frame_count(&self) -> u64 {
        self.frames
    }
}

/// Framerate published by the render thread and read by the console thread
#[derive(Clone, Default)]
pub struct SharedFramerate(Arc<AtomicU32>);

impl SharedFramerate {
    /// Create a shared value initialized to zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a new framerate
    pub fn set(&self, fps: f64) {
        self.0.store((fps as f32).to_bits(), Ordering::Relaxed);
    }

    /// Latest published framerate
    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_fps() {
        let start = Instant::now();
        let mut counter = FrameCounter::starting_at(start);
        for i in 1..=10 {
            counter.frame_at(start + Duration::from_millis(50 * i));
        }
        assert_eq!(counter.frame_count(), 10);
        assert!((counter.fps() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_reports_once_per_second() {
        let start = Instant::now();
        let mut counter = FrameCounter::starting_at(start);
        let reports = (1..=30)
            .filter(|i| counter.frame_at(start + Duration::from_millis(100 * i)))
            .count();
        assert_eq!(reports, 3);
    }

    #[test]
    fn test_shared_framerate() {
        let shared = SharedFramerate::new();
        let reader = shared.clone();
        assert_eq!(reader.get(), 0.0);
        shared.set(59.5);
        assert_eq!(reader.get(), 59.5);
    }
}
