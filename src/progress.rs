//! Sweep completion and time-remaining estimates.

use std::fmt;
use std::time::{Duration, Instant};

/// Completion and time-remaining estimate for a running sweep.
///
/// The estimate extrapolates the mean time per step so far over the steps
/// that remain. There is no smoothing, so the first few estimates swing
/// widely before the average has enough samples to settle.
#[derive(Debug, Clone, Copy)]
pub struct ProgressTracker {
    index: usize,
    total: usize,
    start: Instant,
}

impl ProgressTracker {
    pub fn start(total: usize) -> Self {
        Self::starting_at(total, Instant::now())
    }

    pub fn starting_at(total: usize, start: Instant) -> Self {
        Self {
            index: 0,
            total,
            start,
        }
    }

    /// Record one completed step.
    pub fn advance(&mut self) {
        self.index = (self.index + 1).min(self.total);
    }

    /// Steps completed so far.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn percent_complete(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.index as f64 / self.total as f64 * 100.0
    }

    pub fn estimated_time_remaining(&self) -> Option<Duration> {
        self.estimated_time_remaining_at(Instant::now())
    }

    /// Time remaining as seen at `now`. `None` until a step has completed.
    pub fn estimated_time_remaining_at(&self, now: Instant) -> Option<Duration> {
        if self.index == 0 {
            return None;
        }
        let elapsed = now.saturating_duration_since(self.start).as_secs_f64();
        let pace = elapsed / self.index as f64;
        let remaining = (self.total - self.index) as f64;
        Some(Duration::from_secs_f64(pace * remaining))
    }
}

/// Formats a duration as `H:MM:SS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eta(pub Duration);

impl fmt::Display for Eta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_secs = self.0.as_secs();
        let hours = total_secs / 3600;
        let minutes = (total_secs % 3600) / 60;
        let seconds = total_secs % 60;
        write!(f, "{}:{:02}:{:02}", hours, minutes, seconds)
    }
}
