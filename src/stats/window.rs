//! Time-bounded rolling window of speed magnitudes

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Default span of the averaging window
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(5);

/// Insertion-ordered `(timestamp, magnitude)` pairs no older than `span`
///
/// Pruning is lazy: entries are evicted from the front only when the window
/// is updated or explicitly refreshed. An entry exactly `span` old is kept.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    span: Duration,
    entries: VecDeque<(Instant, f64)>,
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl RollingWindow {
    /// Create an empty window covering `span`
    pub fn new(span: Duration) -> Self {
        Self {
            span,
            entries: VecDeque::with_capacity(64),
        }
    }

    pub fn span(&self) -> Duration {
        self.span
    }

    /// Append a magnitude observed at `now`, then evict stale entries
    pub fn push(&mut self, now: Instant, magnitude: f64) {
        self.entries.push_back((now, magnitude));
        self.prune(now);
    }

    /// Evict entries older than `span` relative to `now`
    pub fn prune(&mut self, now: Instant) {
        while let Some(&(timestamp, _)) = self.entries.front() {
            if now.saturating_duration_since(timestamp) > self.span {
                self.entries.pop_front();
            } else {
                break;
            }
        }
    }

    /// Arithmetic mean of the magnitudes currently held
    pub fn mean(&self) -> Option<f64> {
        if self.entries.is_empty() {
            return None;
        }
        let sum: f64 = self.entries.iter().map(|&(_, m)| m).sum();
        Some(sum / self.entries.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Oldest and newest timestamps held
    pub fn bounds(&self) -> Option<(Instant, Instant)> {
        Some((self.entries.front()?.0, self.entries.back()?.0))
    }
}
