//! Time sources for admission checks.

use parking_lot::Mutex;
use std::time::Instant;

/// A source of timestamps, in seconds, for the limiter.
///
/// All limiters that share state with a sweeper must read the same clock.
pub trait Clock: Send + Sync {
    /// Current reading in seconds with sub-second precision.
    fn now(&self) -> f64;
}

/// Seconds elapsed since the clock was created. Never goes backwards.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// A clock that only moves when told to.
///
/// Used to drive deterministic scenarios in tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<f64>,
}

impl ManualClock {
    /// Create a clock reading `start` seconds.
    pub fn new(start: f64) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Jump to an absolute reading.
    pub fn set(&self, now: f64) {
        *self.now.lock() = now;
    }

    /// Move forward by `secs`.
    pub fn advance(&self, secs: f64) {
        *self.now.lock() += secs;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        *self.now.lock()
    }
}
