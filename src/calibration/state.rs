// ThresholdConfig - the decision threshold and the two means it came from
//
// This is the only durable state of the system. It is written once by the
// calibration flow and read once when the run-time loop starts. The final
// threshold is always the midpoint of the relaxed and concentrated means and
// is recomputed on load, never trusted from disk.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;

/// Relaxed mean, concentrated mean and their midpoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdConfig {
    relaxed_threshold: f64,
    concentration_threshold: f64,
    final_threshold: f64,
}

/// On-disk layout; `final_threshold` is informational only
#[derive(Debug, Deserialize)]
struct StoredThresholds {
    relaxed_threshold: f64,
    concentration_threshold: f64,
    #[serde(default)]
    final_threshold: Option<f64>,
}

impl ThresholdConfig {
    /// Derive the threshold from the two calibration means
    pub fn from_means(relaxed: f64, concentrated: f64) -> Self {
        Self {
            relaxed_threshold: relaxed,
            concentration_threshold: concentrated,
            final_threshold: (relaxed + concentrated) / 2.0,
        }
    }

    pub fn relaxed(&self) -> f64 {
        self.relaxed_threshold
    }

    pub fn concentrated(&self) -> f64 {
        self.concentration_threshold
    }

    /// Decision threshold used by the control loop
    pub fn threshold(&self) -> f64 {
        self.final_threshold
    }

    /// Write the record as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistenceError> {
        let path_str = path.as_ref().display().to_string();
        let json = serde_json::to_string_pretty(self).map_err(|err| {
            PersistenceError::WriteFailed {
                path: path_str.clone(),
                reason: err.to_string(),
            }
        })?;
        fs::write(&path, json).map_err(|err| PersistenceError::WriteFailed {
            path: path_str.clone(),
            reason: err.to_string(),
        })?;
        log::info!("[Thresholds] Saved to {}", path_str);
        Ok(())
    }

    /// Read a record written by `save`
    ///
    /// # Errors
    /// * `PersistenceError::Missing` - File cannot be read
    /// * `PersistenceError::Corrupt` - Not a threshold record, or non-finite values
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str = path.as_ref().display().to_string();
        let contents = fs::read_to_string(&path).map_err(|err| PersistenceError::Missing {
            path: path_str.clone(),
            reason: err.to_string(),
        })?;
        let stored: StoredThresholds =
            serde_json::from_str(&contents).map_err(|err| PersistenceError::Corrupt {
                path: path_str.clone(),
                reason: err.to_string(),
            })?;

        if !stored.relaxed_threshold.is_finite() || !stored.concentration_threshold.is_finite() {
            return Err(PersistenceError::Corrupt {
                path: path_str,
                reason: "threshold means must be finite".to_string(),
            });
        }

        let config = Self::from_means(stored.relaxed_threshold, stored.concentration_threshold);
        if let Some(stored_final) = stored.final_threshold {
            let tolerance = 1e-9 * config.final_threshold.abs().max(1.0);
            if (stored_final - config.final_threshold).abs() > tolerance {
                log::warn!(
                    "[Thresholds] Stored final_threshold {} in {} is not the midpoint of the means; using {}",
                    stored_final,
                    path_str,
                    config.final_threshold
                );
            }
        }
        Ok(config)
    }
}
