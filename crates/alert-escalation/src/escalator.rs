//! Alert escalation state machine

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use fatigue_metrics::{FatigueLevel, FatigueMetricsSnapshot};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::EscalatorConfig;
use crate::decision::{AlertDecision, AlertLevel};
use crate::export::{self, AlertLogDocument, AlertSummary};
use crate::EscalationError;

/// Number of trailing events included in the summary
const RECENT_EVENTS: usize = 10;

/// Record of an alert level change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub timestamp: f64,
    pub old_level: AlertLevel,
    pub new_level: AlertLevel,
    pub perclos_percentage: f64,
    pub fatigue_level: FatigueLevel,
}

/// Hook invoked synchronously whenever its level is entered
pub type AlertCallback = Box<dyn FnMut(&AlertEvent) + Send>;

/// Turns the fatigue classification stream into hysteresis-controlled,
/// time-escalating alert levels
///
/// Transitions are driven by threshold crossing with asymmetric
/// hysteresis (escalation is never delayed, de-escalation requires
/// clearing the buffer below the current level's threshold) and by
/// forced time-based escalation when a microsleep or severe-fatigue
/// condition persists at one level.
pub struct AlertEscalator {
    config: EscalatorConfig,
    current_level: AlertLevel,
    /// Set on the update that entered the current level
    time_entered_level: Option<f64>,
    last_perclos: f64,
    session_start: Option<f64>,
    last_timestamp: Option<f64>,
    event_log: Vec<AlertEvent>,
    callbacks: HashMap<AlertLevel, AlertCallback>,
}

impl AlertEscalator {
    /// Create an escalator, validating the configuration
    pub fn new(config: EscalatorConfig) -> Result<Self, EscalationError> {
        config.validate()?;
        info!(
            hysteresis = config.hysteresis_buffer,
            escalation_secs = config.escalation_time_secs,
            "Creating alert escalator"
        );
        Ok(Self {
            config,
            current_level: AlertLevel::Alert,
            time_entered_level: None,
            last_perclos: 0.0,
            session_start: None,
            last_timestamp: None,
            event_log: Vec::new(),
            callbacks: HashMap::new(),
        })
    }

    /// Register a hook invoked whenever `level` is entered
    pub fn on_level(&mut self, level: AlertLevel, callback: AlertCallback) {
        self.callbacks.insert(level, callback);
    }

    /// Ingest one metrics snapshot and produce the alert decision
    ///
    /// `timestamp` defaults to wall-clock now; pass the same timestamps
    /// fed to the metrics engine for deterministic sessions.
    pub fn update(
        &mut self,
        metrics: &FatigueMetricsSnapshot,
        timestamp: Option<f64>,
    ) -> AlertDecision {
        let now = timestamp.unwrap_or_else(now_secs);
        let perclos = metrics.perclos_percentage;
        self.session_start.get_or_insert(now);
        let entered = *self.time_entered_level.get_or_insert(now);
        self.last_timestamp = Some(now);

        let natural = self.config.thresholds.classify(perclos);

        // Escalation is immediate; de-escalation must clear the buffer
        // below the current level's own threshold.
        let mut next = if natural >= self.current_level {
            natural
        } else {
            let floor =
                self.config.thresholds.for_level(self.current_level) - self.config.hysteresis_buffer;
            if perclos < floor {
                natural
            } else {
                debug!(
                    perclos,
                    level = ?self.current_level,
                    floor,
                    "Hysteresis hold"
                );
                self.current_level
            }
        };

        // Sustained fatigue at an unchanged level forces one step up
        if next == self.current_level
            && now - entered > self.config.escalation_time_secs
            && (metrics.microsleep_count > 0 || metrics.fatigue_level == FatigueLevel::SevereFatigue)
        {
            next = self.current_level.next();
            if next != self.current_level {
                warn!(
                    from = ?self.current_level,
                    to = ?next,
                    seconds_at_level = now - entered,
                    "Time-based escalation"
                );
            }
        }

        let changed = next != self.current_level;
        if changed {
            if next > self.current_level && next >= AlertLevel::Critical {
                warn!(from = ?self.current_level, to = ?next, perclos, "Alert escalated");
            } else {
                info!(from = ?self.current_level, to = ?next, perclos, "Alert level changed");
            }
            let event = AlertEvent {
                timestamp: now,
                old_level: self.current_level,
                new_level: next,
                perclos_percentage: perclos,
                fatigue_level: metrics.fatigue_level,
            };
            self.current_level = next;
            self.time_entered_level = Some(now);
            if let Some(callback) = self.callbacks.get_mut(&next) {
                callback(&event);
            }
            self.event_log.push(event);
        }

        self.last_perclos = perclos;
        self.build_decision(changed, now)
    }

    fn build_decision(&self, changed: bool, now: f64) -> AlertDecision {
        let level = self.current_level;
        AlertDecision {
            alert_level: level,
            alert_changed: changed,
            severity: level.severity(),
            message: level.message(),
            recommendation: level.recommendation(),
            action_required: level.action_required(),
            audio_alert: level >= AlertLevel::Warning,
            visual_alert: level.color(),
            break_suggestion: level.break_suggestion(),
            interventions: level.interventions(),
            safety_concern: level >= AlertLevel::Critical,
            session_duration_secs: now - self.session_start.unwrap_or(now),
            time_at_level_secs: now - self.time_entered_level.unwrap_or(now),
        }
    }

    /// Current alert level
    pub fn current_level(&self) -> AlertLevel {
        self.current_level
    }

    /// PERCLOS percentage seen on the most recent update
    pub fn last_perclos_percentage(&self) -> f64 {
        self.last_perclos
    }

    /// All level changes recorded this session
    pub fn event_log(&self) -> &[AlertEvent] {
        &self.event_log
    }

    /// Session-level alert statistics
    pub fn get_alert_summary(&self) -> AlertSummary {
        let session_duration_secs = match (self.session_start, self.last_timestamp) {
            (Some(start), Some(last)) => last - start,
            _ => 0.0,
        };
        let events_per_hour = if session_duration_secs > 0.0 {
            self.event_log.len() as f64 * 3600.0 / session_duration_secs
        } else {
            0.0
        };

        let mut level_counts: HashMap<AlertLevel, usize> = HashMap::new();
        for event in &self.event_log {
            *level_counts.entry(event.new_level).or_insert(0) += 1;
        }

        let recent_start = self.event_log.len().saturating_sub(RECENT_EVENTS);
        AlertSummary {
            session_duration_secs,
            total_alert_events: self.event_log.len(),
            events_per_hour,
            level_counts,
            current_level: self.current_level,
            last_alert_timestamp: self.event_log.last().map(|e| e.timestamp),
            recent_events: self.event_log[recent_start..].to_vec(),
        }
    }

    /// Serialize the event log and summary to a JSON file
    ///
    /// Generates a timestamped filename when `path` is omitted. Returns
    /// the path written. A write failure leaves the in-memory log intact.
    pub fn save_alert_log(&self, path: Option<&Path>) -> Result<PathBuf, EscalationError> {
        let document = AlertLogDocument {
            summary: self.get_alert_summary(),
            events: self.event_log.clone(),
        };
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => PathBuf::from(export::default_log_filename()),
        };
        export::write_log(&document, &path)?;
        info!(path = %path.display(), events = document.events.len(), "Alert log saved");
        Ok(path)
    }

    /// Clear the event log and return to the base level
    ///
    /// Registered callbacks and thresholds are kept.
    pub fn reset_session(&mut self) {
        info!("Resetting alert session");
        self.event_log.clear();
        self.current_level = AlertLevel::Alert;
        self.time_entered_level = None;
        self.session_start = None;
        self.last_timestamp = None;
        self.last_perclos = 0.0;
    }
}

/// Wall-clock seconds since the Unix epoch
fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
