//! Sliding-window fatigue metrics engine

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use crate::analysis::{FatigueLevel, FatigueMetricsSnapshot, SessionSummary};
use crate::blink::{BlinkEvent, BlinkStats, BlinkTracker};
use crate::config::{CalibrationMode, EngineConfig};
use crate::window::{TimeWindow, Timestamped};
use crate::MetricsError;

/// Minimum window span (seconds) before the blink rate is extrapolated.
/// Below this the rate is reported as zero to avoid wild extrapolation.
const MIN_BLINK_RATE_SPAN_SECS: f64 = 10.0;

/// One eye-openness measurement
#[derive(Debug, Clone, Copy)]
struct Sample {
    openness: f64,
    timestamp: f64,
}

impl Timestamped for Sample {
    fn timestamp(&self) -> f64 {
        self.timestamp
    }
}

/// Converts a stream of per-frame eye-openness samples into PERCLOS,
/// blink, and microsleep metrics over a trailing window
///
/// One engine per monitoring session; create a fresh pair per stream
/// when monitoring multiple cameras. Calls must be externally serialized
/// if fed from multiple threads.
pub struct FatigueMetricsEngine {
    config: EngineConfig,
    /// Live closed-eye cutoff; follows the calibration preset once set
    eye_closed_threshold: f64,
    calibration: Option<CalibrationMode>,
    samples: TimeWindow<Sample>,
    blinks: TimeWindow<BlinkEvent>,
    tracker: BlinkTracker,
    stats: BlinkStats,
    first_timestamp: Option<f64>,
    last_timestamp: Option<f64>,
    /// Lifetime counters backing the whole-session PERCLOS
    lifetime_samples: u64,
    lifetime_closed: u64,
}

impl FatigueMetricsEngine {
    /// Create an engine, validating the configuration
    pub fn new(config: EngineConfig) -> Result<Self, MetricsError> {
        config.validate()?;
        info!(
            window_secs = config.window_duration_secs,
            fps = config.fps,
            "Creating fatigue metrics engine"
        );
        let capacity = config.capacity_hint();
        Ok(Self {
            eye_closed_threshold: config.eye_closed_threshold,
            samples: TimeWindow::new(config.window_duration_secs, capacity),
            blinks: TimeWindow::new(config.window_duration_secs, 64),
            tracker: BlinkTracker::default(),
            stats: BlinkStats::default(),
            calibration: None,
            first_timestamp: None,
            last_timestamp: None,
            lifetime_samples: 0,
            lifetime_closed: 0,
            config,
        })
    }

    /// Apply a calibration preset for the eye-closed threshold
    ///
    /// Idempotent and callable at any time. Samples already classified
    /// against the previous threshold are not recomputed; switching
    /// mid-session therefore mixes thresholds in the retained history.
    pub fn set_calibration(&mut self, mode: CalibrationMode) {
        if self.calibration != Some(mode) {
            info!(?mode, threshold = mode.eye_closed_threshold(), "Calibration set");
        }
        self.calibration = Some(mode);
        self.eye_closed_threshold = mode.eye_closed_threshold();
    }

    /// Calibration preset currently in effect, if any
    pub fn calibration(&self) -> Option<CalibrationMode> {
        self.calibration
    }

    /// Ingest one sample and produce the current metrics
    ///
    /// `timestamp` defaults to wall-clock now and must be non-decreasing
    /// across calls. Rejected input leaves the engine state unchanged.
    pub fn update(
        &mut self,
        eye_openness: f64,
        timestamp: Option<f64>,
    ) -> Result<FatigueMetricsSnapshot, MetricsError> {
        // Validate before any mutation
        if !(0.0..=1.0).contains(&eye_openness) {
            return Err(MetricsError::OpennessOutOfRange(eye_openness));
        }
        let timestamp = timestamp.unwrap_or_else(now_secs);
        // NaN slips past the ordering check below and would poison
        // window eviction and span arithmetic
        if !timestamp.is_finite() {
            return Err(MetricsError::NonFiniteTimestamp(timestamp));
        }
        if let Some(previous) = self.last_timestamp {
            if timestamp < previous {
                return Err(MetricsError::NonMonotonicTimestamp {
                    current: timestamp,
                    previous,
                });
            }
        }

        let is_closed = eye_openness < self.eye_closed_threshold;

        self.samples.push(Sample {
            openness: eye_openness,
            timestamp,
        });
        self.blinks
            .evict_before(timestamp - self.config.window_duration_secs);

        self.first_timestamp.get_or_insert(timestamp);
        self.last_timestamp = Some(timestamp);
        self.lifetime_samples += 1;
        if is_closed {
            self.lifetime_closed += 1;
        }

        if let Some(blink) = self.tracker.observe(is_closed, timestamp) {
            let is_microsleep = blink.duration_ms >= self.config.microsleep_threshold_ms;
            if is_microsleep {
                warn!(duration_ms = blink.duration_ms, "Microsleep detected");
            } else {
                debug!(duration_ms = blink.duration_ms, "Blink completed");
            }
            self.stats.record(&blink, is_microsleep);
            self.blinks.push(blink);
        }

        Ok(self.snapshot())
    }

    /// Classify a PERCLOS ratio against the configured boundaries
    pub fn classify(&self, perclos: f64) -> FatigueLevel {
        if perclos < self.config.mild_threshold {
            FatigueLevel::Alert
        } else if perclos < self.config.perclos_threshold {
            FatigueLevel::MildFatigue
        } else if perclos < self.config.severe_threshold {
            FatigueLevel::Drowsy
        } else {
            FatigueLevel::SevereFatigue
        }
    }

    /// Lifetime session aggregates; valid at any time, including before
    /// the first update
    pub fn get_summary(&self) -> SessionSummary {
        let session_duration_secs = match (self.first_timestamp, self.last_timestamp) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        };
        let overall_perclos = if self.lifetime_samples == 0 {
            0.0
        } else {
            self.lifetime_closed as f64 / self.lifetime_samples as f64
        };
        SessionSummary {
            session_duration_secs,
            overall_perclos,
            total_blinks: self.stats.total_blinks,
            total_microsleeps: self.stats.total_microsleeps,
            calibration: self.calibration,
            min_blink_duration_ms: self.stats.min_duration_ms,
            max_blink_duration_ms: self.stats.max_duration_ms,
            avg_blink_duration_ms: self.stats.avg_duration_ms(),
        }
    }

    /// Clear all windows, counters, and calibration back to construction
    /// state
    pub fn reset(&mut self) {
        info!("Resetting fatigue metrics engine");
        self.samples.clear();
        self.blinks.clear();
        self.tracker = BlinkTracker::default();
        self.stats = BlinkStats::default();
        self.calibration = None;
        self.eye_closed_threshold = self.config.eye_closed_threshold;
        self.first_timestamp = None;
        self.last_timestamp = None;
        self.lifetime_samples = 0;
        self.lifetime_closed = 0;
    }

    fn snapshot(&self) -> FatigueMetricsSnapshot {
        let data_points = self.samples.len();

        // PERCLOS is undefined below ~1 second of data
        let perclos = if data_points < self.config.fps as usize {
            0.0
        } else {
            let closed = self
                .samples
                .iter()
                .filter(|s| s.openness < self.eye_closed_threshold)
                .count();
            closed as f64 / data_points as f64
        };

        let span = self.samples.span_secs();
        let blink_rate = if span < MIN_BLINK_RATE_SPAN_SECS {
            0.0
        } else {
            self.blinks.len() as f64 / span * 60.0
        };

        let microsleep_count = self
            .blinks
            .iter()
            .filter(|b| b.duration_ms >= self.config.microsleep_threshold_ms)
            .count();

        let avg_blink_duration_ms = if self.blinks.is_empty() {
            0.0
        } else {
            self.blinks.iter().map(|b| b.duration_ms).sum::<f64>() / self.blinks.len() as f64
        };

        let fatigue_level = self.classify(perclos);

        FatigueMetricsSnapshot {
            perclos,
            perclos_percentage: perclos * 100.0,
            fatigue_level,
            blink_rate,
            microsleep_count,
            avg_blink_duration_ms,
            recommendation: fatigue_level.recommendation().to_string(),
            data_points,
            window_coverage: (span / self.config.window_duration_secs).min(1.0),
        }
    }
}

/// Wall-clock seconds since the Unix epoch
fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FRAME: f64 = 1.0 / 30.0;

    fn engine() -> FatigueMetricsEngine {
        FatigueMetricsEngine::new(EngineConfig::default()).unwrap()
    }

    /// Feed `secs` seconds of constant openness at 30fps, starting at `start`
    fn feed_constant(
        engine: &mut FatigueMetricsEngine,
        openness: f64,
        start: f64,
        secs: f64,
    ) -> FatigueMetricsSnapshot {
        let frames = (secs * 30.0) as usize;
        let mut last = None;
        for i in 0..frames {
            let ts = start + i as f64 * FRAME;
            last = Some(engine.update(openness, Some(ts)).unwrap());
        }
        last.unwrap()
    }

    #[test]
    fn test_alert_with_open_eyes() {
        // 90s of wide-open eyes under real-face calibration
        let mut engine = engine();
        engine.set_calibration(CalibrationMode::Real);
        let snapshot = feed_constant(&mut engine, 0.9, 0.0, 90.0);

        assert!(snapshot.perclos_percentage < 0.001);
        assert_eq!(snapshot.fatigue_level, FatigueLevel::Alert);
        assert_eq!(engine.get_summary().total_blinks, 0);
    }

    #[test]
    fn test_sustained_closure_is_severe_fatigue() {
        // Last 20s of a 60s window fully closed
        let mut engine = engine();
        feed_constant(&mut engine, 0.9, 0.0, 40.0);
        let snapshot = feed_constant(&mut engine, 0.03, 40.0, 20.0);

        assert!((snapshot.perclos_percentage - 33.3).abs() < 1.0);
        assert_eq!(snapshot.fatigue_level, FatigueLevel::SevereFatigue);
    }

    #[test]
    fn test_invalid_window_duration_rejected() {
        let config = EngineConfig {
            window_duration_secs: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            FatigueMetricsEngine::new(config),
            Err(MetricsError::Configuration(_))
        ));
    }

    #[test]
    fn test_rejected_input_leaves_state_unchanged() {
        // A rejected frame must not corrupt the window
        let mut engine = engine();
        engine.update(0.9, Some(1.0)).unwrap();

        let err = engine.update(1.5, Some(2.0)).unwrap_err();
        assert!(matches!(err, MetricsError::OpennessOutOfRange(_)));

        // Engine still consistent: next valid call succeeds with one more sample
        let snapshot = engine.update(0.9, Some(2.0)).unwrap();
        assert_eq!(snapshot.data_points, 2);
        assert_eq!(engine.get_summary().total_blinks, 0);
    }

    #[test]
    fn test_non_monotonic_timestamp_rejected() {
        let mut engine = engine();
        engine.update(0.9, Some(10.0)).unwrap();
        let err = engine.update(0.9, Some(9.0)).unwrap_err();
        assert!(matches!(err, MetricsError::NonMonotonicTimestamp { .. }));

        // Equal timestamps are allowed (non-decreasing)
        assert!(engine.update(0.9, Some(10.0)).is_ok());
    }

    #[test]
    fn test_non_finite_timestamp_rejected() {
        let mut engine = engine();
        engine.update(0.9, Some(1.0)).unwrap();

        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = engine.update(0.9, Some(bad)).unwrap_err();
            assert!(matches!(err, MetricsError::NonFiniteTimestamp(_)));
        }

        // Window stays usable after the rejected frames
        let snapshot = engine.update(0.9, Some(2.0)).unwrap();
        assert_eq!(snapshot.data_points, 2);
    }

    #[test]
    fn test_window_eviction_bound() {
        // After 90s of samples, the window holds only the last 60s
        let mut engine = engine();
        let snapshot = feed_constant(&mut engine, 0.9, 0.0, 90.0);
        assert!(snapshot.data_points <= 1801);
        assert!((snapshot.window_coverage - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_microsleep_threshold_boundary() {
        // A 500ms closed run is a microsleep, 499ms is not
        let mut engine = engine();
        engine.update(0.9, Some(0.0)).unwrap();
        engine.update(0.05, Some(1.0)).unwrap();
        let snapshot = engine.update(0.9, Some(1.499)).unwrap();
        assert_eq!(snapshot.microsleep_count, 0);
        assert_eq!(engine.get_summary().total_microsleeps, 0);

        engine.update(0.05, Some(2.0)).unwrap();
        let snapshot = engine.update(0.9, Some(2.5)).unwrap();
        assert_eq!(snapshot.microsleep_count, 1);
        assert_eq!(engine.get_summary().total_microsleeps, 1);
        assert_eq!(engine.get_summary().total_blinks, 2);
    }

    #[test]
    fn test_blink_counting() {
        // A 3-frame closed run at 30fps is one ~100ms blink
        let mut engine = engine();
        engine.update(0.9, Some(0.0)).unwrap();
        engine.update(0.05, Some(FRAME)).unwrap();
        engine.update(0.05, Some(2.0 * FRAME)).unwrap();
        engine.update(0.05, Some(3.0 * FRAME)).unwrap();
        engine.update(0.9, Some(4.0 * FRAME)).unwrap();

        let summary = engine.get_summary();
        assert_eq!(summary.total_blinks, 1);
        assert!((summary.avg_blink_duration_ms - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_blink_rate_guard() {
        // Below 10s of span the rate is zero, after that it extrapolates
        let mut engine = engine();
        engine.update(0.9, Some(0.0)).unwrap();
        engine.update(0.05, Some(0.1)).unwrap();
        let snapshot = engine.update(0.9, Some(0.2)).unwrap();
        assert_eq!(snapshot.blink_rate, 0.0);

        let snapshot = feed_constant(&mut engine, 0.9, 1.0, 14.0);
        // 1 blink over ~15s of span -> ~4/min
        assert!(snapshot.blink_rate > 3.0 && snapshot.blink_rate < 5.0);
    }

    #[test]
    fn test_zero_input_summary() {
        // A fresh engine reports zeros instead of erroring
        let engine = engine();
        let summary = engine.get_summary();
        assert_eq!(summary.session_duration_secs, 0.0);
        assert_eq!(summary.overall_perclos, 0.0);
        assert_eq!(summary.total_blinks, 0);
        assert_eq!(summary.total_microsleeps, 0);
        assert_eq!(summary.calibration, None);
    }

    #[test]
    fn test_perclos_needs_one_second_of_data() {
        let mut engine = engine();
        // 29 fully-closed samples: below the fps floor, PERCLOS stays 0
        for i in 0..29 {
            let snapshot = engine.update(0.05, Some(i as f64 * FRAME)).unwrap();
            assert_eq!(snapshot.perclos, 0.0);
        }
        let snapshot = engine.update(0.05, Some(29.0 * FRAME)).unwrap();
        assert_eq!(snapshot.perclos, 1.0);
    }

    #[test]
    fn test_calibration_switch_does_not_recompute_history() {
        let mut engine = engine();
        engine.set_calibration(CalibrationMode::Synthetic);
        // 0.1 is closed under Synthetic (0.15)
        feed_constant(&mut engine, 0.1, 0.0, 2.0);
        let closed_so_far = engine.get_summary().overall_perclos;
        assert_eq!(closed_so_far, 1.0);

        // Switch to Real (0.08): 0.1 now counts as open for future samples
        // only; the lifetime counters keep the old classifications.
        engine.set_calibration(CalibrationMode::Real);
        feed_constant(&mut engine, 0.1, 2.0, 2.0);
        let summary = engine.get_summary();
        assert!((summary.overall_perclos - 0.5).abs() < 0.01);
        assert_eq!(summary.calibration, Some(CalibrationMode::Real));
    }

    #[test]
    fn test_reset_clears_session() {
        let mut engine = engine();
        engine.set_calibration(CalibrationMode::Real);
        feed_constant(&mut engine, 0.03, 0.0, 2.0);
        engine.reset();

        let summary = engine.get_summary();
        assert_eq!(summary.session_duration_secs, 0.0);
        assert_eq!(summary.overall_perclos, 0.0);
        assert_eq!(summary.calibration, None);
        // Timestamps may restart from zero after a reset
        assert!(engine.update(0.9, Some(0.0)).is_ok());
    }

    proptest! {
        /// PERCLOS stays within [0, 1] for arbitrary sample streams
        #[test]
        fn prop_perclos_bounds(values in prop::collection::vec(0.0f64..=1.0, 1..200)) {
            let mut engine = engine();
            for (i, v) in values.iter().enumerate() {
                let snapshot = engine.update(*v, Some(i as f64 * FRAME)).unwrap();
                prop_assert!(snapshot.perclos >= 0.0);
                prop_assert!(snapshot.perclos <= 1.0);
                prop_assert!(snapshot.window_coverage <= 1.0);
            }
        }

        /// Classification never decreases as PERCLOS increases
        #[test]
        fn prop_classification_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
            let engine = engine();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(engine.classify(lo) <= engine.classify(hi));
        }
    }
}
