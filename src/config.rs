//! Configuration management for the beta-drive pipeline
//!
//! Every tunable of the pipeline (sample rate, filter corners, beta band,
//! spike limit, move duration, calibration length, serial ports) lives here
//! and can be overridden from a JSON file without recompiling. Missing keys
//! fall back to the defaults the hardware was tuned with.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Default location of the optional tuning file
pub const DEFAULT_CONFIG_PATH: &str = "beta_drive.json";

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dsp: DspConfig,
    pub control: ControlConfig,
    pub calibration: CalibrationConfig,
    pub serial: SerialConfig,
}

/// Signal-processing parameters shared by calibration and run time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DspConfig {
    /// Nominal sensor sample rate in Hz; also the window length in samples
    pub sample_rate: u32,
    /// Mains interference frequency removed by the notch
    pub notch_hz: f64,
    /// Quality factor of the notch
    pub notch_q: f64,
    pub bandpass_low_hz: f64,
    pub bandpass_high_hz: f64,
    /// Inclusive beta band summed from the PSD
    pub beta_low_hz: f64,
    pub beta_high_hz: f64,
}

impl Default for DspConfig {
    fn default() -> Self {
        Self {
            sample_rate: 512,
            notch_hz: 50.0,
            notch_q: 30.0,
            bandpass_low_hz: 0.5,
            bandpass_high_hz: 30.0,
            beta_low_hz: 14.0,
            beta_high_hz: 30.0,
        }
    }
}

impl DspConfig {
    /// Samples per non-overlapping analysis window
    pub fn window_len(&self) -> usize {
        self.sample_rate as usize
    }

    pub fn nyquist_hz(&self) -> f64 {
        self.sample_rate as f64 / 2.0
    }

    /// Check that every frequency is representable at the sample rate
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate {
                sample_rate: self.sample_rate,
            });
        }
        let nyquist_hz = self.nyquist_hz();

        if !(self.bandpass_low_hz > 0.0
            && self.bandpass_low_hz < self.bandpass_high_hz
            && self.bandpass_high_hz < nyquist_hz)
        {
            return Err(ConfigError::InvalidBandpass {
                low_hz: self.bandpass_low_hz,
                high_hz: self.bandpass_high_hz,
                nyquist_hz,
            });
        }

        if !(self.notch_hz > 0.0 && self.notch_hz < nyquist_hz && self.notch_q > 0.0) {
            return Err(ConfigError::InvalidNotch {
                freq_hz: self.notch_hz,
                q: self.notch_q,
                nyquist_hz,
            });
        }

        if !(self.beta_low_hz >= 0.0
            && self.beta_low_hz <= self.beta_high_hz
            && self.beta_high_hz <= nyquist_hz)
        {
            return Err(ConfigError::BetaBandOutOfRange {
                low_hz: self.beta_low_hz,
                high_hz: self.beta_high_hz,
                nyquist_hz,
            });
        }

        Ok(())
    }
}

/// Run-time decision parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Largest accepted jump between consecutive features (energy units)
    pub spike_limit: f64,
    /// Seconds a move command stays engaged before the automatic stop
    pub move_duration_secs: f64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            spike_limit: 50.0,
            move_duration_secs: 3.0,
        }
    }
}

/// Convert a seconds field, rejecting values `Duration` cannot hold
pub fn duration_from_secs(field: &'static str, secs: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidDuration { field, secs })
}

impl ControlConfig {
    /// Check the spike limit and move duration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spike_limit.is_nan() || self.spike_limit < 0.0 {
            return Err(ConfigError::InvalidSpikeLimit {
                spike_limit: self.spike_limit,
            });
        }
        duration_from_secs("move_duration_secs", self.move_duration_secs)?;
        Ok(())
    }

    /// Move duration; out-of-range values saturate (see `validate`)
    pub fn move_duration(&self) -> Duration {
        duration_from_secs("move_duration_secs", self.move_duration_secs).unwrap_or(
            if self.move_duration_secs > 0.0 {
                Duration::MAX
            } else {
                Duration::ZERO
            },
        )
    }
}

/// Calibration procedure configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Wall-clock length of each labeled session
    pub duration_secs: f64,
    /// Where the threshold record is written and later read
    pub thresholds_path: String,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            duration_secs: 15.0,
            thresholds_path: "thresholds.json".to_string(),
        }
    }
}

impl CalibrationConfig {
    /// Session length must be a positive, representable number of seconds
    pub fn validate(&self) -> Result<(), ConfigError> {
        let duration = duration_from_secs("duration_secs", self.duration_secs)?;
        if duration.is_zero() {
            return Err(ConfigError::InvalidDuration {
                field: "duration_secs",
                secs: self.duration_secs,
            });
        }
        Ok(())
    }

    /// Session length; out-of-range values saturate (see `validate`)
    pub fn duration(&self) -> Duration {
        duration_from_secs("duration_secs", self.duration_secs).unwrap_or(
            if self.duration_secs > 0.0 {
                Duration::MAX
            } else {
                Duration::ZERO
            },
        )
    }
}

/// Serial port settings for the sensor and the actuator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub sensor_port: String,
    pub sensor_baud: u32,
    pub actuator_port: String,
    pub actuator_baud: u32,
    /// Per-read timeout; expiry means "no sample this iteration"
    pub read_timeout_ms: u64,
    /// Pause after opening the actuator while the board resets
    pub settle_delay_ms: u64,
    /// Consecutive failed reads (framing, parity, I/O) before the sensor counts as lost
    pub max_read_errors: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            sensor_port: "COM9".to_string(),
            sensor_baud: 115_200,
            actuator_port: "COM14".to_string(),
            actuator_baud: 9600,
            read_timeout_ms: 1000,
            settle_delay_ms: 2000,
            max_read_errors: crate::link::DEFAULT_MAX_READ_ERRORS,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or the defaults if the file is missing or
    /// not valid JSON. Parameter consistency is checked separately by
    /// `DspConfig::validate`.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the working directory
    pub fn load() -> Self {
        Self::load_from_file(DEFAULT_CONFIG_PATH)
    }

    /// Check every section that can hold an unusable value
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dsp.validate()?;
        self.control.validate()?;
        self.calibration.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_huge_move_duration_is_an_error() {
        let config: AppConfig =
            serde_json::from_str(r#"{"control":{"move_duration_secs":1e30}}"#).unwrap();
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidDuration {
                field: "move_duration_secs",
                secs: 1e30
            })
        );
        assert_eq!(config.control.move_duration(), Duration::MAX);
    }

    #[test]
    fn test_negative_or_nan_spike_limit_is_an_error() {
        for spike_limit in [-1.0, f64::NAN] {
            let control = ControlConfig {
                spike_limit,
                ..ControlConfig::default()
            };
            assert!(matches!(
                control.validate(),
                Err(ConfigError::InvalidSpikeLimit { .. })
            ));
        }
        assert!(ControlConfig::default().validate().is_ok());
    }

    #[test]
    fn test_calibration_duration_bounds() {
        for duration_secs in [0.0, -3.0, f64::INFINITY, 1e300] {
            let calibration = CalibrationConfig {
                duration_secs,
                ..CalibrationConfig::default()
            };
            assert!(matches!(
                calibration.validate(),
                Err(ConfigError::InvalidDuration { field: "duration_secs", .. })
            ));
        }
        assert_eq!(CalibrationConfig::default().duration(), Duration::from_secs(15));
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.dsp.sample_rate, 512);
        assert_eq!(config.dsp.notch_hz, 50.0);
        assert_eq!(config.dsp.notch_q, 30.0);
        assert_eq!(config.dsp.beta_low_hz, 14.0);
        assert_eq!(config.dsp.beta_high_hz, 30.0);
        assert_eq!(config.control.spike_limit, 50.0);
        assert_eq!(config.control.move_duration(), Duration::from_secs(3));
        assert_eq!(config.calibration.duration(), Duration::from_secs(15));
        assert!(config.dsp.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{ "control": { "spike_limit": 80.0 } }"#).unwrap();
        assert_eq!(parsed.control.spike_limit, 80.0);
        assert_eq!(parsed.control.move_duration_secs, 3.0);
        assert_eq!(parsed.dsp, DspConfig::default());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from_file("/nonexistent/beta_drive.json");
        assert_eq!(config.serial.sensor_baud, 115_200);
    }

    #[test]
    fn test_beta_band_above_nyquist_rejected() {
        let dsp = DspConfig {
            sample_rate: 50,
            bandpass_high_hz: 20.0,
            notch_hz: 10.0,
            ..DspConfig::default()
        };
        assert!(matches!(
            dsp.validate(),
            Err(ConfigError::BetaBandOutOfRange { .. })
        ));
    }

    #[test]
    fn test_bandpass_must_be_ordered() {
        let dsp = DspConfig {
            bandpass_low_hz: 40.0,
            bandpass_high_hz: 30.0,
            ..DspConfig::default()
        };
        assert!(matches!(
            dsp.validate(),
            Err(ConfigError::InvalidBandpass { .. })
        ));
    }

    #[test]
    fn test_zero_sample_rate_rejected() {
        let dsp = DspConfig {
            sample_rate: 0,
            ..DspConfig::default()
        };
        assert_eq!(
            dsp.validate(),
            Err(ConfigError::InvalidSampleRate { sample_rate: 0 })
        );
    }
}
