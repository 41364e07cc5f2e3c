//! Core sliding-window rate limiter implementation.

use dashmap::DashMap;
use std::time::Duration;
use tracing::{debug, trace};

use super::decision::Decision;
use super::key::ClientKey;
use super::window::Window;
use crate::error::{Result, TollgateError};

/// Smallest wait reported for a rejection.
const MIN_WAIT: Duration = Duration::from_nanos(1);

/// Limits applied by a [`SlidingWindowLimiter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterConfig {
    max_calls: u32,
    period: Duration,
}

impl LimiterConfig {
    /// Validate and build a limiter configuration.
    ///
    /// Both the call budget and the period must be non-zero.
    pub fn new(max_calls: u32, period: Duration) -> Result<Self> {
        if max_calls == 0 {
            return Err(TollgateError::Config(
                "max_calls must be greater than zero".to_string(),
            ));
        }
        if period.is_zero() {
            return Err(TollgateError::Config(
                "period must be greater than zero".to_string(),
            ));
        }
        Ok(Self { max_calls, period })
    }

    /// Requests allowed per window.
    pub fn max_calls(&self) -> u32 {
        self.max_calls
    }

    /// Length of the trailing window.
    pub fn period(&self) -> Duration {
        self.period
    }
}

/// A per-client sliding-window log rate limiter.
///
/// Each client key owns a [`Window`] of admitted request timestamps. A check
/// prunes the window, then either records the request or reports how long
/// until the oldest entry ages out.
///
/// This struct is thread-safe and can be shared across multiple tasks. Each
/// check holds the lock of the key's shard for the whole
/// prune/count/record sequence, so concurrent requests from one client can
/// never overshoot the budget.
pub struct SlidingWindowLimiter {
    /// Request logs indexed by client key
    windows: DashMap<ClientKey, Window>,
    config: LimiterConfig,
}

impl SlidingWindowLimiter {
    /// Create a limiter allowing `max_calls` requests per `period`.
    pub fn new(max_calls: u32, period: Duration) -> Result<Self> {
        Ok(Self::with_config(LimiterConfig::new(max_calls, period)?))
    }

    /// Create a limiter from an already validated configuration.
    pub fn with_config(config: LimiterConfig) -> Self {
        Self {
            windows: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> LimiterConfig {
        self.config
    }

    /// Decide whether the request from `key` at `now` (seconds) is admitted.
    ///
    /// Admitted requests are recorded; rejected ones are not and leave the
    /// window as pruned.
    pub fn check(&self, key: &ClientKey, now: f64) -> Decision {
        let period = self.config.period.as_secs_f64();

        trace!(key = %key, now = now, "Checking rate limit");

        let mut window = self.windows.entry(key.clone()).or_insert_with(|| {
            debug!(
                key = %key,
                max_calls = self.config.max_calls,
                period = ?self.config.period,
                "Creating new rate limit window"
            );
            Window::new()
        });

        window.prune(now, period);

        if window.len() < self.config.max_calls as usize {
            window.record(now);
            return Decision::Admit;
        }

        // max_calls > 0, so a full window always has an oldest entry
        let oldest = window.oldest().unwrap_or(now);
        let wait = (period - (now - oldest)).min(period);
        let wait = Duration::try_from_secs_f64(wait)
            .unwrap_or(self.config.period)
            .max(MIN_WAIT);

        debug!(
            key = %key,
            in_window = window.len(),
            wait = ?wait,
            "Rate limit exceeded"
        );

        Decision::Reject { wait }
    }

    /// Remove windows that can no longer affect a decision at `now`.
    ///
    /// Returns the number of windows removed.
    pub fn sweep(&self, now: f64) -> usize {
        let period = self.config.period.as_secs_f64();
        let mut removed = 0;

        self.windows.retain(|_, window| {
            let keep = !window.is_stale(now, period);
            if !keep {
                removed += 1;
            }
            keep
        });

        removed
    }

    /// Number of requests currently recorded for `key`.
    ///
    /// Entries are only pruned by `check`, so this may include expired
    /// timestamps.
    pub fn window_len(&self, key: &ClientKey) -> usize {
        self.windows.get(key).map(|w| w.len()).unwrap_or(0)
    }

    /// Get the number of tracked client keys.
    pub fn key_count(&self) -> usize {
        self.windows.len()
    }

    /// Clear all windows.
    ///
    /// This is primarily useful for testing.
    pub fn clear(&self) {
        self.windows.clear();
    }
}
