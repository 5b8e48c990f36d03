// Configuration consistency errors

use crate::error::ErrorCode;
use std::fmt;

/// Configuration error code constants
///
/// Error code range: 1001-1006
pub struct ConfigErrorCodes {}

impl ConfigErrorCodes {
    /// Sample rate must be positive
    pub const INVALID_SAMPLE_RATE: i32 = 1001;

    /// Band-pass cutoffs are not ordered inside (0, nyquist)
    pub const INVALID_BANDPASS: i32 = 1002;

    /// Notch frequency or quality factor unusable
    pub const INVALID_NOTCH: i32 = 1003;

    /// Beta band is not representable at the configured sample rate
    pub const BETA_BAND_OUT_OF_RANGE: i32 = 1004;

    /// A duration is negative, non-finite or too large to represent
    pub const INVALID_DURATION: i32 = 1005;

    /// Spike limit is negative or not a number
    pub const INVALID_SPIKE_LIMIT: i32 = 1006;
}

/// Parameter mismatches detected before any window is processed
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Sample rate of zero
    InvalidSampleRate { sample_rate: u32 },

    /// Band-pass cutoffs outside (0, nyquist) or not increasing
    InvalidBandpass { low_hz: f64, high_hz: f64, nyquist_hz: f64 },

    /// Notch frequency outside (0, nyquist) or non-positive Q
    InvalidNotch { freq_hz: f64, q: f64, nyquist_hz: f64 },

    /// Beta band outside [0, nyquist] or inverted
    BetaBandOutOfRange { low_hz: f64, high_hz: f64, nyquist_hz: f64 },

    /// Seconds value that is not a usable `Duration`
    InvalidDuration { field: &'static str, secs: f64 },

    /// Spike limit below zero or NaN
    InvalidSpikeLimit { spike_limit: f64 },
}

impl ErrorCode for ConfigError {
    fn code(&self) -> i32 {
        match self {
            ConfigError::InvalidSampleRate { .. } => ConfigErrorCodes::INVALID_SAMPLE_RATE,
            ConfigError::InvalidBandpass { .. } => ConfigErrorCodes::INVALID_BANDPASS,
            ConfigError::InvalidNotch { .. } => ConfigErrorCodes::INVALID_NOTCH,
            ConfigError::BetaBandOutOfRange { .. } => ConfigErrorCodes::BETA_BAND_OUT_OF_RANGE,
            ConfigError::InvalidDuration { .. } => ConfigErrorCodes::INVALID_DURATION,
            ConfigError::InvalidSpikeLimit { .. } => ConfigErrorCodes::INVALID_SPIKE_LIMIT,
        }
    }

    fn message(&self) -> String {
        match self {
            ConfigError::InvalidSampleRate { sample_rate } => {
                format!("Sample rate must be greater than 0 (got {})", sample_rate)
            }
            ConfigError::InvalidBandpass {
                low_hz,
                high_hz,
                nyquist_hz,
            } => format!(
                "Band-pass {}-{} Hz must satisfy 0 < low < high < {} Hz",
                low_hz, high_hz, nyquist_hz
            ),
            ConfigError::InvalidNotch {
                freq_hz,
                q,
                nyquist_hz,
            } => format!(
                "Notch at {} Hz (Q={}) must lie in (0, {}) Hz with Q > 0",
                freq_hz, q, nyquist_hz
            ),
            ConfigError::BetaBandOutOfRange {
                low_hz,
                high_hz,
                nyquist_hz,
            } => format!(
                "Beta band {}-{} Hz is not representable below nyquist {} Hz",
                low_hz, high_hz, nyquist_hz
            ),
            ConfigError::InvalidDuration { field, secs } => {
                format!("{} must be a finite, non-negative number of seconds (got {})", field, secs)
            }
            ConfigError::InvalidSpikeLimit { spike_limit } => {
                format!("Spike limit must be >= 0 (got {})", spike_limit)
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConfigError (code {}): {}",
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ConfigError {}
