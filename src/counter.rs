//! Sliding-window measurement of the time between pipeline cycles.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Measures the average duration between successive [`update`] calls over a
/// sliding window of the most recent samples.
///
/// The counter keeps a bounded FIFO of inter-call durations together with
/// their running sum, so the average is O(1) to read. It has no terminal
/// state; recreate it to reset.
///
/// [`update`]: FrameCounter::update
pub struct FrameCounter {
    max_samples: usize,
    last_call: Instant,
    sum: Duration,
    samples: VecDeque<Duration>,
}

impl FrameCounter {
    /// Default number of samples in the window.
    pub const DEFAULT_SAMPLE_COUNT: usize = 25;

    /// Create a counter averaging over the last `max_samples` updates.
    pub fn new(max_samples: usize) -> Self {
        FrameCounter {
            max_samples: max_samples.max(1),
            last_call: Instant::now(),
            sum: Duration::ZERO,
            samples: VecDeque::with_capacity(max_samples.max(1)),
        }
    }

    /// Record the duration since the previous call as a new sample.
    ///
    /// Once the window is full, every update evicts the oldest sample.
    pub fn update(&mut self) {
        self.record(Instant::now());
    }

    fn record(&mut self, now: Instant) {
        let duration = now.duration_since(self.last_call);
        self.samples.push_back(duration);
        self.sum += duration;
        if self.samples.len() > self.max_samples {
            if let Some(oldest) = self.samples.pop_front() {
                self.sum -= oldest;
            }
        }
        self.last_call = now;
    }

    /// The average inter-call duration over the current window.
    ///
    /// `None` until the first [`update`](Self::update) has recorded a sample.
    pub fn average_frame_duration(&self) -> Option<Duration> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.sum / self.samples.len() as u32)
    }

    /// Number of samples currently in the window.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

impl Default for FrameCounter {
    fn default() -> Self {
        FrameCounter::new(Self::DEFAULT_SAMPLE_COUNT)
    }
}
