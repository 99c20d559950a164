//! Alert log summary and JSON export

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::decision::AlertLevel;
use crate::escalator::AlertEvent;
use crate::EscalationError;

/// Session-level alert statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertSummary {
    /// First to last update timestamp, in seconds
    pub session_duration_secs: f64,

    /// Level changes recorded this session
    pub total_alert_events: usize,

    /// Level changes extrapolated to an hourly rate
    pub events_per_hour: f64,

    /// Level changes counted by the level entered
    pub level_counts: HashMap<AlertLevel, usize>,

    pub current_level: AlertLevel,

    /// Timestamp of the most recent level change, if any
    pub last_alert_timestamp: Option<f64>,

    /// Bounded tail of the event log
    pub recent_events: Vec<AlertEvent>,
}

/// Document written by `save_alert_log`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertLogDocument {
    pub summary: AlertSummary,
    pub events: Vec<AlertEvent>,
}

/// Timestamp-derived default filename, e.g. `alert_log_20260825_142530.json`
pub fn default_log_filename() -> String {
    format!("alert_log_{}.json", Local::now().format("%Y%m%d_%H%M%S"))
}

/// Write the document as pretty-printed JSON
pub fn write_log(document: &AlertLogDocument, path: &Path) -> Result<(), EscalationError> {
    let json = serde_json::to_string_pretty(document)?;
    fs::write(path, json)?;
    Ok(())
}
