//! Blink detection state machine and lifetime blink statistics

use serde::{Deserialize, Serialize};

use crate::window::Timestamped;

/// Completed eye-closure event
///
/// Derived from a contiguous run of closed samples bounded by open
/// samples on both sides. A run still closed when the stream ends is
/// never emitted; blinks and microsleeps at a session boundary are
/// therefore undercounted by at most one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlinkEvent {
    /// Timestamp of the first closed sample (seconds)
    pub start_time: f64,
    /// Timestamp of the sample that reopened the eye (seconds)
    pub end_time: f64,
    /// Closure duration in milliseconds
    pub duration_ms: f64,
}

impl Timestamped for BlinkEvent {
    fn timestamp(&self) -> f64 {
        self.end_time
    }
}

/// Lifetime blink statistics, accumulated for the whole session
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BlinkStats {
    /// Completed blinks since session start
    pub total_blinks: u64,
    /// Blinks whose duration exceeded the microsleep threshold
    pub total_microsleeps: u64,
    /// Shortest blink seen, in milliseconds (0 before the first blink)
    pub min_duration_ms: f64,
    /// Longest blink seen, in milliseconds
    pub max_duration_ms: f64,
    sum_duration_ms: f64,
}

impl BlinkStats {
    /// Record a completed blink
    pub fn record(&mut self, event: &BlinkEvent, is_microsleep: bool) {
        if self.total_blinks == 0 {
            self.min_duration_ms = event.duration_ms;
            self.max_duration_ms = event.duration_ms;
        } else {
            self.min_duration_ms = self.min_duration_ms.min(event.duration_ms);
            self.max_duration_ms = self.max_duration_ms.max(event.duration_ms);
        }
        self.total_blinks += 1;
        self.sum_duration_ms += event.duration_ms;
        if is_microsleep {
            self.total_microsleeps += 1;
        }
    }

    /// Mean blink duration in milliseconds (0 before the first blink)
    pub fn avg_duration_ms(&self) -> f64 {
        if self.total_blinks == 0 {
            0.0
        } else {
            self.sum_duration_ms / self.total_blinks as f64
        }
    }
}

/// Open/closed run tracker
///
/// Emits a [`BlinkEvent`] on each closed→open transition. The open→closed
/// transition only records the run start; nothing is emitted while the
/// eye stays closed.
#[derive(Debug, Clone, Default)]
pub struct BlinkTracker {
    closed: bool,
    run_start: f64,
}

impl BlinkTracker {
    /// Feed one classified sample; returns the completed blink if this
    /// sample reopened the eye
    pub fn observe(&mut self, is_closed: bool, timestamp: f64) -> Option<BlinkEvent> {
        match (self.closed, is_closed) {
            (false, true) => {
                self.closed = true;
                self.run_start = timestamp;
                None
            }
            (true, false) => {
                self.closed = false;
                Some(BlinkEvent {
                    start_time: self.run_start,
                    end_time: timestamp,
                    duration_ms: (timestamp - self.run_start) * 1000.0,
                })
            }
            _ => None,
        }
    }

    /// Whether the eye is currently in a closed run
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f64 = 1.0 / 30.0;

    #[test]
    fn test_three_frame_blink_is_100ms() {
        let mut tracker = BlinkTracker::default();

        // open, 3 closed frames, open - 30fps
        assert!(tracker.observe(false, 0.0).is_none());
        assert!(tracker.observe(true, FRAME).is_none());
        assert!(tracker.observe(true, 2.0 * FRAME).is_none());
        assert!(tracker.observe(true, 3.0 * FRAME).is_none());
        let blink = tracker.observe(false, 4.0 * FRAME).unwrap();

        assert!((blink.duration_ms - 100.0).abs() < 0.01);
        assert_eq!(blink.start_time, FRAME);
    }

    #[test]
    fn test_unclosed_run_not_emitted() {
        let mut tracker = BlinkTracker::default();
        tracker.observe(false, 0.0);
        tracker.observe(true, 1.0);
        tracker.observe(true, 2.0);
        // Stream ends mid-closure; no event was produced
        assert!(tracker.is_closed());
    }

    #[test]
    fn test_consecutive_blinks() {
        let mut tracker = BlinkTracker::default();
        tracker.observe(true, 0.0);
        let first = tracker.observe(false, 0.1).unwrap();
        tracker.observe(true, 0.5);
        let second = tracker.observe(false, 0.7).unwrap();

        assert!((first.duration_ms - 100.0).abs() < 1e-9);
        assert!((second.duration_ms - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_stats_min_max_avg() {
        let mut stats = BlinkStats::default();
        let blink = |duration_ms: f64| BlinkEvent {
            start_time: 0.0,
            end_time: duration_ms / 1000.0,
            duration_ms,
        };

        stats.record(&blink(100.0), false);
        stats.record(&blink(300.0), false);
        stats.record(&blink(600.0), true);

        assert_eq!(stats.total_blinks, 3);
        assert_eq!(stats.total_microsleeps, 1);
        assert_eq!(stats.min_duration_ms, 100.0);
        assert_eq!(stats.max_duration_ms, 600.0);
        assert!((stats.avg_duration_ms() - 333.333).abs() < 0.01);
    }

    #[test]
    fn test_stats_empty() {
        let stats = BlinkStats::default();
        assert_eq!(stats.avg_duration_ms(), 0.0);
        assert_eq!(stats.min_duration_ms, 0.0);
    }
}
