//! Background removal of stale client windows.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use super::clock::Clock;
use super::limiter::SlidingWindowLimiter;

/// Spawn a task that periodically sweeps stale windows from every limiter.
///
/// The limiters must be checked against the same `clock`. Abort the
/// returned handle to stop sweeping.
pub fn spawn_sweeper(
    limiters: Vec<Arc<SlidingWindowLimiter>>,
    clock: Arc<dyn Clock>,
    every: Duration,
) -> JoinHandle<()> {
    info!(
        interval = ?every,
        limiters = limiters.len(),
        "Starting stale window sweeper"
    );

    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let removed = sweep_all(&limiters, clock.as_ref());
            if removed > 0 {
                debug!(removed = removed, "Swept stale rate limit windows");
            }
        }
    })
}

/// Run one sweep over `limiters`, returning the total windows removed.
pub fn sweep_all(limiters: &[Arc<SlidingWindowLimiter>], clock: &dyn Clock) -> usize {
    let now = clock.now();
    limiters.iter().map(|limiter| limiter.sweep(now)).sum()
}
