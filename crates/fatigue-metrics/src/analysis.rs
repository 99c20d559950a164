//! Metrics snapshots and session summary

use serde::{Deserialize, Serialize};

use crate::config::CalibrationMode;

/// Discretized fatigue classification, ordered by severity
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FatigueLevel {
    #[default]
    Alert,
    MildFatigue,
    Drowsy,
    SevereFatigue,
}

impl FatigueLevel {
    /// Static intervention text for this level
    pub fn recommendation(self) -> &'static str {
        match self {
            FatigueLevel::Alert => "Driver is alert. Continue monitoring.",
            FatigueLevel::MildFatigue => {
                "Early signs of fatigue. Consider fresh air or a short pause."
            }
            FatigueLevel::Drowsy => "Drowsiness detected. Take a break at the next opportunity.",
            FatigueLevel::SevereFatigue => {
                "Severe fatigue. Stop driving as soon as it is safe to do so."
            }
        }
    }
}

/// Per-update metrics produced by the engine
///
/// A new value is produced on every update call; snapshots share no
/// state with each other or with the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatigueMetricsSnapshot {
    /// Fraction of window samples with closed eyes (0..1)
    pub perclos: f64,

    /// Same value expressed as a percentage (0..100)
    pub perclos_percentage: f64,

    /// Classification derived from PERCLOS
    pub fatigue_level: FatigueLevel,

    /// Blinks per minute, extrapolated from the rolling window.
    /// Zero until the window spans at least 10 seconds.
    pub blink_rate: f64,

    /// Microsleeps currently inside the rolling window
    pub microsleep_count: usize,

    /// Mean blink duration over the rolling window, in milliseconds
    pub avg_blink_duration_ms: f64,

    /// Static recommendation text for the current fatigue level
    pub recommendation: String,

    /// Samples currently inside the rolling window
    pub data_points: usize,

    /// Window time actually covered / target duration, capped at 1.0
    pub window_coverage: f64,
}

/// Lifetime (non-windowed) session aggregates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// First to last timestamp seen, in seconds
    pub session_duration_secs: f64,

    /// PERCLOS over the entire session history (0..1)
    pub overall_perclos: f64,

    /// Completed blinks since session start
    pub total_blinks: u64,

    /// Microsleeps since session start
    pub total_microsleeps: u64,

    /// Calibration preset in effect, if one was set
    pub calibration: Option<CalibrationMode>,

    /// Shortest blink in milliseconds (0 if no blinks yet)
    pub min_blink_duration_ms: f64,

    /// Longest blink in milliseconds
    pub max_blink_duration_ms: f64,

    /// Mean blink duration in milliseconds
    pub avg_blink_duration_ms: f64,
}
