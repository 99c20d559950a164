//! Trailing-by-time sliding window

use std::collections::VecDeque;

/// Items stored in a [`TimeWindow`] expose their timestamp in seconds
pub trait Timestamped {
    fn timestamp(&self) -> f64;
}

/// Sliding window holding the trailing `duration_secs` of items
///
/// Eviction is time-based relative to the newest item, not count-based:
/// pushing an item drops everything older than `newest - duration_secs`.
/// Assumes non-decreasing timestamps (enforced by the engine).
#[derive(Debug, Clone)]
pub struct TimeWindow<T> {
    items: VecDeque<T>,
    duration_secs: f64,
}

impl<T: Timestamped> TimeWindow<T> {
    /// Create a window with a pre-allocation hint
    pub fn new(duration_secs: f64, capacity_hint: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity_hint),
            duration_secs,
        }
    }

    /// Push an item and evict everything that fell out of the window
    pub fn push(&mut self, item: T) {
        let cutoff = item.timestamp() - self.duration_secs;
        self.items.push_back(item);
        while let Some(front) = self.items.front() {
            if front.timestamp() < cutoff {
                self.items.pop_front();
            } else {
                break;
            }
        }
    }

    /// Evict items older than `cutoff` without pushing
    pub fn evict_before(&mut self, cutoff: f64) {
        while let Some(front) = self.items.front() {
            if front.timestamp() < cutoff {
                self.items.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Time actually covered by the window (newest - oldest), in seconds
    pub fn span_secs(&self) -> f64 {
        match (self.items.front(), self.items.back()) {
            (Some(first), Some(last)) => last.timestamp() - first.timestamp(),
            _ => 0.0,
        }
    }

    pub fn oldest_timestamp(&self) -> Option<f64> {
        self.items.front().map(Timestamped::timestamp)
    }

    pub fn newest_timestamp(&self) -> Option<f64> {
        self.items.back().map(Timestamped::timestamp)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
