//! Alert levels and the per-update decision

use serde::{Deserialize, Serialize};

/// Alert severity level, ordered for escalation comparisons
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    #[default]
    Alert,
    Warning,
    Critical,
    Emergency,
}

impl AlertLevel {
    /// All levels in ascending severity order
    pub const ALL: [AlertLevel; 4] = [
        AlertLevel::Alert,
        AlertLevel::Warning,
        AlertLevel::Critical,
        AlertLevel::Emergency,
    ];

    /// Next higher level; Emergency saturates
    pub fn next(self) -> AlertLevel {
        match self {
            AlertLevel::Alert => AlertLevel::Warning,
            AlertLevel::Warning => AlertLevel::Critical,
            AlertLevel::Critical => AlertLevel::Emergency,
            AlertLevel::Emergency => AlertLevel::Emergency,
        }
    }

    pub fn severity(self) -> &'static str {
        match self {
            AlertLevel::Alert => "none",
            AlertLevel::Warning => "medium",
            AlertLevel::Critical => "high",
            AlertLevel::Emergency => "critical",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            AlertLevel::Alert => "Driver alert. Monitoring active.",
            AlertLevel::Warning => "Signs of fatigue detected. Stay attentive.",
            AlertLevel::Critical => "High fatigue level. A break is strongly advised.",
            AlertLevel::Emergency => "Dangerous fatigue level. Stop driving immediately.",
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            AlertLevel::Alert => "Keep monitoring. No action needed.",
            AlertLevel::Warning => "Open a window or adjust the cabin temperature.",
            AlertLevel::Critical => "Pull over at the next safe opportunity and rest.",
            AlertLevel::Emergency => "Stop the vehicle as soon as it is safe. Do not continue.",
        }
    }

    /// Dashboard indicator color
    pub fn color(self) -> &'static str {
        match self {
            AlertLevel::Alert => "green",
            AlertLevel::Warning => "yellow",
            AlertLevel::Critical => "orange",
            AlertLevel::Emergency => "red",
        }
    }

    pub fn break_suggestion(self) -> &'static str {
        match self {
            AlertLevel::Alert => "No break needed.",
            AlertLevel::Warning => "Consider a 5-minute pause within the next half hour.",
            AlertLevel::Critical => "Take a 15-minute break now.",
            AlertLevel::Emergency => "Stop now and rest for at least 20 minutes.",
        }
    }

    /// Intervention actions the embedding application may surface
    pub fn interventions(self) -> &'static [&'static str] {
        match self {
            AlertLevel::Alert => &[],
            AlertLevel::Warning => &["fresh_air", "posture_change", "hydration"],
            AlertLevel::Critical => &["pull_over", "caffeine", "short_nap"],
            AlertLevel::Emergency => &["stop_vehicle", "rest_20_minutes", "call_relief_driver"],
        }
    }

    /// Whether immediate action is mandatory at this level
    pub fn action_required(self) -> bool {
        self >= AlertLevel::Critical
    }
}

/// Outcome of one escalator update
///
/// A plain value object; every field is JSON-serializable so the caller
/// can forward it to UI, audio, or logging layers unchanged.
#[derive(Debug, Clone, Serialize)]
pub struct AlertDecision {
    /// Current alert level after this update
    pub alert_level: AlertLevel,

    /// Whether this update changed the level
    pub alert_changed: bool,

    pub severity: &'static str,
    pub message: &'static str,
    pub recommendation: &'static str,

    /// True for Critical and Emergency
    pub action_required: bool,

    /// True for Warning and above
    pub audio_alert: bool,

    /// Indicator color for the current level
    pub visual_alert: &'static str,

    pub break_suggestion: &'static str,
    pub interventions: &'static [&'static str],

    /// True for Critical and Emergency
    pub safety_concern: bool,

    /// Seconds since the first update of the session
    pub session_duration_secs: f64,

    /// Seconds spent at the current level
    pub time_at_level_secs: f64,
}
