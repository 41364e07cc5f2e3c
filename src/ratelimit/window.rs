//! Per-client log of recent request timestamps.

use std::collections::VecDeque;

/// Timestamps (in seconds) of the admitted requests of one client.
///
/// Timestamps are appended in the order requests are admitted. Callers may
/// read the clock before taking the window's lock, so two close requests can
/// land slightly out of order; `oldest` and `newest` therefore scan the log.
#[derive(Debug, Clone, Default)]
pub struct Window {
    timestamps: VecDeque<f64>,
}

impl Window {
    /// Create an empty window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every timestamp that is `period` seconds or more older than `now`.
    pub fn prune(&mut self, now: f64, period: f64) {
        self.timestamps.retain(|&t| now - t < period);
    }

    /// Record an admitted request.
    pub fn record(&mut self, now: f64) {
        self.timestamps.push_back(now);
    }

    /// The oldest retained timestamp.
    pub fn oldest(&self) -> Option<f64> {
        self.timestamps.iter().copied().reduce(f64::min)
    }

    /// The latest retained timestamp.
    pub fn newest(&self) -> Option<f64> {
        self.timestamps.iter().copied().reduce(f64::max)
    }

    /// Whether nothing recorded here could still count at `now`.
    pub fn is_stale(&self, now: f64, period: f64) -> bool {
        match self.newest() {
            Some(newest) => now - newest >= period,
            None => true,
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prune_keeps_entries_inside_period() {
        let mut window = Window::new();
        window.record(0.0);
        window.record(5.0);
        window.record(9.5);

        window.prune(10.0, 10.0);

        assert_eq!(window.len(), 2);
        assert_eq!(window.oldest(), Some(5.0));
        assert_eq!(window.newest(), Some(9.5));
    }

    #[test]
    fn test_prune_boundary_is_exclusive() {
        let mut window = Window::new();
        window.record(0.0);

        // exactly one period old means expired
        window.prune(10.0, 10.0);
        assert!(window.is_empty());
    }

    #[test]
    fn test_prune_is_idempotent() {
        let mut window = Window::new();
        window.record(1.0);
        window.record(2.0);
        window.record(8.0);

        window.prune(11.5, 10.0);
        let after_first = window.len();
        window.prune(11.5, 10.0);

        assert_eq!(window.len(), after_first);
        assert_eq!(window.oldest(), Some(2.0));
    }

    #[test]
    fn test_out_of_order_records() {
        let mut window = Window::new();
        window.record(5.0);
        window.record(4.0);
        window.record(4.5);

        assert_eq!(window.oldest(), Some(4.0));
        assert_eq!(window.newest(), Some(5.0));
        assert!(!window.is_stale(14.5, 10.0));
    }

    #[test]
    fn test_is_stale() {
        let mut window = Window::new();
        assert!(window.is_stale(0.0, 10.0));

        window.record(3.0);
        assert!(!window.is_stale(12.9, 10.0));
        assert!(window.is_stale(13.0, 10.0));
    }
}
