//! Engine configuration and calibration presets

use serde::{Deserialize, Serialize};

use crate::MetricsError;

/// Calibration preset for the eye-closed threshold
///
/// The eye-openness scale differs between genuine webcam footage and
/// rendered/avatar faces, so the closed-eye cutoff is tuned per source.
/// Switching mode mid-session changes only the threshold applied to
/// future samples; history already classified against the old threshold
/// is not recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationMode {
    /// Genuine human faces (webcam footage)
    Real,
    /// Rendered or avatar faces
    Synthetic,
}

impl CalibrationMode {
    /// Eye-closed threshold tuned for this face source
    pub fn eye_closed_threshold(self) -> f64 {
        match self {
            CalibrationMode::Real => 0.08,
            CalibrationMode::Synthetic => 0.15,
        }
    }
}

/// Fatigue metrics engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// PERCLOS ratio above which the driver is classified at least Drowsy
    pub perclos_threshold: f64,

    /// Per-sample openness cutoff below which the eye counts as closed.
    /// Overridden when a calibration mode is set.
    pub eye_closed_threshold: f64,

    /// Trailing window duration in seconds
    pub window_duration_secs: f64,

    /// Expected frame rate; used only as a buffer capacity hint and as
    /// the minimum sample count before PERCLOS is reported
    pub fps: u32,

    /// Closed-run duration above which a blink counts as a microsleep
    pub microsleep_threshold_ms: f64,

    /// PERCLOS ratio above which the driver is classified MildFatigue
    pub mild_threshold: f64,

    /// PERCLOS ratio above which the driver is classified SevereFatigue
    pub severe_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            perclos_threshold: 0.15,
            eye_closed_threshold: 0.2,
            window_duration_secs: 60.0,
            fps: 30,
            microsleep_threshold_ms: 500.0,
            mild_threshold: 0.08,
            severe_threshold: 0.25,
        }
    }
}

impl EngineConfig {
    /// Validate construction parameters
    pub fn validate(&self) -> Result<(), MetricsError> {
        if !(self.perclos_threshold > 0.0 && self.perclos_threshold < 1.0) {
            return Err(MetricsError::Configuration(format!(
                "perclos_threshold must be in (0, 1), got {}",
                self.perclos_threshold
            )));
        }
        if !(self.eye_closed_threshold > 0.0 && self.eye_closed_threshold < 1.0) {
            return Err(MetricsError::Configuration(format!(
                "eye_closed_threshold must be in (0, 1), got {}",
                self.eye_closed_threshold
            )));
        }
        if !(self.window_duration_secs > 0.0) {
            return Err(MetricsError::Configuration(format!(
                "window_duration_secs must be positive, got {}",
                self.window_duration_secs
            )));
        }
        if self.fps == 0 {
            return Err(MetricsError::Configuration(
                "fps must be positive".to_string(),
            ));
        }
        if !(self.microsleep_threshold_ms > 0.0) {
            return Err(MetricsError::Configuration(format!(
                "microsleep_threshold_ms must be positive, got {}",
                self.microsleep_threshold_ms
            )));
        }
        // Classification boundaries must be strictly increasing
        if !(self.mild_threshold > 0.0
            && self.mild_threshold < self.perclos_threshold
            && self.perclos_threshold < self.severe_threshold
            && self.severe_threshold < 1.0)
        {
            return Err(MetricsError::Configuration(format!(
                "fatigue thresholds must satisfy 0 < mild ({}) < drowsy ({}) < severe ({}) < 1",
                self.mild_threshold, self.perclos_threshold, self.severe_threshold
            )));
        }
        Ok(())
    }

    /// Buffer capacity hint: samples expected to fit in one window
    pub fn capacity_hint(&self) -> usize {
        (self.fps as f64 * self.window_duration_secs).ceil() as usize
    }
}
