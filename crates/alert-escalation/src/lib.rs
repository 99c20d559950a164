//! Alert Escalation
//!
//! Turns the per-frame fatigue metrics stream into hysteresis-controlled,
//! time-escalating alert levels with intervention text:
//! - Threshold-based level selection with asymmetric hysteresis
//!   (escalate fast, de-escalate slow)
//! - Forced escalation when fatigue persists at one level too long
//! - An append-only event log of level changes, exportable as JSON
//!
//! Consumes [`fatigue_metrics::FatigueMetricsSnapshot`] values; one
//! escalator per monitoring session, fed from a single thread.

pub mod config;
pub mod decision;
pub mod escalator;
pub mod export;

pub use config::{AlertThresholds, EscalatorConfig};
pub use decision::{AlertDecision, AlertLevel};
pub use escalator::{AlertCallback, AlertEscalator, AlertEvent};
pub use export::{AlertLogDocument, AlertSummary};

use thiserror::Error;

/// Alert escalation error types
#[derive(Error, Debug)]
pub enum EscalationError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to write alert log: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize alert log: {0}")]
    Serialization(#[from] serde_json::Error),
}
