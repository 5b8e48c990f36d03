// Calibration error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Calibration error code constants
///
/// Error code range: 2001-2003
pub struct CalibrationErrorCodes {}

impl CalibrationErrorCodes {
    /// Session ended without a single completed window
    pub const NO_WINDOWS_COMPLETED: i32 = 2001;

    /// Sensor failed irrecoverably during a session
    pub const SENSOR: i32 = 2002;

    /// Session mean is not a finite number
    pub const INVALID_MEAN: i32 = 2003;
}

/// Log a calibration error with structured context
///
/// Logs the numeric code, component and message so a failed session can be
/// traced back to its condition.
pub fn log_calibration_error(err: &CalibrationError, context: &str) {
    error!(
        "Calibration error in {}: code={}, component=Calibrator, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Calibration-related errors
///
/// A session without windows means the duration is too short for the window
/// size at the configured sample rate. It is reported instead of producing
/// a NaN threshold.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// Duration elapsed (or the stream closed) before one window completed
    NoWindowsCompleted { label: String, duration_secs: f64 },

    /// Sensor link failed during the session
    Sensor { reason: String },

    /// Mean over the session is NaN or infinite
    InvalidMean { label: String, mean: f64 },
}

impl ErrorCode for CalibrationError {
    fn code(&self) -> i32 {
        match self {
            CalibrationError::NoWindowsCompleted { .. } => {
                CalibrationErrorCodes::NO_WINDOWS_COMPLETED
            }
            CalibrationError::Sensor { .. } => CalibrationErrorCodes::SENSOR,
            CalibrationError::InvalidMean { .. } => CalibrationErrorCodes::INVALID_MEAN,
        }
    }

    fn message(&self) -> String {
        match self {
            CalibrationError::NoWindowsCompleted {
                label,
                duration_secs,
            } => format!(
                "No complete window during {} session of {:.1}s; duration too short for the window size",
                label, duration_secs
            ),
            CalibrationError::Sensor { reason } => format!("Sensor failure: {}", reason),
            CalibrationError::InvalidMean { label, mean } => {
                format!("Mean beta energy for {} is not finite ({})", label, mean)
            }
        }
    }
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CalibrationError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for CalibrationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibration_error_codes() {
        assert_eq!(
            CalibrationError::NoWindowsCompleted {
                label: "relaxed".to_string(),
                duration_secs: 0.5
            }
            .code(),
            CalibrationErrorCodes::NO_WINDOWS_COMPLETED
        );
        assert_eq!(
            CalibrationError::Sensor {
                reason: "gone".to_string()
            }
            .code(),
            CalibrationErrorCodes::SENSOR
        );
        assert_eq!(
            CalibrationError::InvalidMean {
                label: "relaxed".to_string(),
                mean: f64::NAN
            }
            .code(),
            CalibrationErrorCodes::INVALID_MEAN
        );
    }

    #[test]
    fn test_calibration_error_messages() {
        let err = CalibrationError::NoWindowsCompleted {
            label: "concentrated".to_string(),
            duration_secs: 0.5,
        };
        assert!(err.message().contains("concentrated"));
        assert!(err.message().contains("too short"));

        let err = CalibrationError::Sensor {
            reason: "port closed".to_string(),
        };
        assert_eq!(err.message(), "Sensor failure: port closed");
    }

    #[test]
    fn test_calibration_error_display() {
        let err = CalibrationError::Sensor {
            reason: "x".to_string(),
        };
        let display = format!("{}", err);
        assert!(display.contains("CalibrationError"));
        assert!(display.contains(&err.code().to_string()));
    }
}
