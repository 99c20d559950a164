//! Escalator configuration

use serde::{Deserialize, Serialize};

use crate::decision::AlertLevel;
use crate::EscalationError;

/// Escalation thresholds in PERCLOS percentage points
///
/// Must be strictly increasing in alert < warning < critical < emergency
/// order. The `alert` threshold is the de-escalation floor for the base
/// level; natural level selection only compares against the upper three.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AlertThresholds {
    pub alert: f64,
    pub warning: f64,
    pub critical: f64,
    pub emergency: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            alert: 8.0,
            warning: 15.0,
            critical: 25.0,
            emergency: 40.0,
        }
    }
}

impl AlertThresholds {
    /// Threshold associated with a level
    pub fn for_level(&self, level: AlertLevel) -> f64 {
        match level {
            AlertLevel::Alert => self.alert,
            AlertLevel::Warning => self.warning,
            AlertLevel::Critical => self.critical,
            AlertLevel::Emergency => self.emergency,
        }
    }

    /// Highest level whose threshold the PERCLOS percentage meets
    pub fn classify(&self, perclos_percentage: f64) -> AlertLevel {
        if perclos_percentage >= self.emergency {
            AlertLevel::Emergency
        } else if perclos_percentage >= self.critical {
            AlertLevel::Critical
        } else if perclos_percentage >= self.warning {
            AlertLevel::Warning
        } else {
            AlertLevel::Alert
        }
    }

    fn validate(&self) -> Result<(), EscalationError> {
        let ordered = self.alert < self.warning
            && self.warning < self.critical
            && self.critical < self.emergency;
        if !ordered {
            return Err(EscalationError::Configuration(format!(
                "alert thresholds must be strictly increasing: {} < {} < {} < {}",
                self.alert, self.warning, self.critical, self.emergency
            )));
        }
        Ok(())
    }
}

/// Alert escalator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalatorConfig {
    /// Level thresholds (PERCLOS percent)
    pub thresholds: AlertThresholds,

    /// De-escalating below a level requires PERCLOS under
    /// (level threshold - buffer), preventing flapping near a boundary
    pub hysteresis_buffer: f64,

    /// Seconds at an unchanged level before a persisting microsleep or
    /// severe-fatigue condition forces escalation one step up
    pub escalation_time_secs: f64,
}

impl Default for EscalatorConfig {
    fn default() -> Self {
        Self {
            thresholds: AlertThresholds::default(),
            hysteresis_buffer: 2.0,
            escalation_time_secs: 30.0,
        }
    }
}

impl EscalatorConfig {
    /// Validate construction parameters
    pub fn validate(&self) -> Result<(), EscalationError> {
        self.thresholds.validate()?;
        if self.hysteresis_buffer < 0.0 {
            return Err(EscalationError::Configuration(format!(
                "hysteresis_buffer must be non-negative, got {}",
                self.hysteresis_buffer
            )));
        }
        if !(self.escalation_time_secs > 0.0) {
            return Err(EscalationError::Configuration(format!(
                "escalation_time_secs must be positive, got {}",
                self.escalation_time_secs
            )));
        }
        Ok(())
    }
}
