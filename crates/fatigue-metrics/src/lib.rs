//! Fatigue Metrics Engine
//!
//! Converts a per-frame stream of eye-openness measurements into
//! drowsiness metrics:
//! - PERCLOS (percentage of eye closure over a trailing window)
//! - Blink detection and blink rate
//! - Microsleep detection (prolonged eye closure)
//! - Discretized fatigue-level classification
//!
//! The engine is single-threaded and pull-based: the caller owns the
//! camera/video loop and pushes one sample per processed frame. Face and
//! eye landmark extraction happen upstream; this crate only consumes the
//! resulting eye-openness scalar.

pub mod analysis;
pub mod blink;
pub mod config;
pub mod engine;
pub mod window;

pub use analysis::{FatigueLevel, FatigueMetricsSnapshot, SessionSummary};
pub use blink::{BlinkEvent, BlinkStats};
pub use config::{CalibrationMode, EngineConfig};
pub use engine::FatigueMetricsEngine;

use thiserror::Error;

/// Fatigue metrics error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricsError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Eye openness {0} outside valid range [0, 1]")]
    OpennessOutOfRange(f64),

    #[error("Timestamp {0} is not finite")]
    NonFiniteTimestamp(f64),

    #[error("Timestamp {current} precedes previous sample timestamp {previous}")]
    NonMonotonicTimestamp { current: f64, previous: f64 },
}
