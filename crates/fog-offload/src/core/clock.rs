//! Simulated time anchored to the wall clock.

use std::time::{Duration, Instant};

/// Clock translating between wall-clock time and simulated seconds.
///
/// `time_scale` is the number of wall-clock seconds per simulated second.
/// Tests typically use a small scale so that multi-second workloads run in
/// milliseconds of real time.
#[derive(Debug, Clone, Copy)]
pub struct SimClock {
    start: Instant,
    time_scale: f64,
}

impl SimClock {
    /// Creates a clock starting at simulated time zero.
    pub fn new(time_scale: f64) -> Self {
        assert!(time_scale > 0., "time scale must be positive");
        Self {
            start: Instant::now(),
            time_scale,
        }
    }

    /// Returns the current simulated time in seconds.
    pub fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64() / self.time_scale
    }

    /// Converts a simulated duration to a wall-clock duration.
    pub fn to_wall(&self, sim_seconds: f64) -> Duration {
        Duration::from_secs_f64(sim_seconds.max(0.) * self.time_scale)
    }
}
