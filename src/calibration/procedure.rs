// Calibrator - timed feature collection under a labeled condition
//
// The calibration flow runs two sessions on the same sensor:
// 1. RELAXED for the configured duration
// 2. CONCENTRATED for the configured duration
//
// Each session pushes samples through the feature pipeline and keeps one
// beta energy per completed window. The two session means are combined into
// the decision threshold by `ThresholdConfig::from_means`.

use std::time::Duration;

use crate::analysis::FeaturePipeline;
use crate::calibration::state::ThresholdConfig;
use crate::error::CalibrationError;
use crate::link::{Clock, Reading, SampleSource};

/// Labeled mental state being calibrated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationCondition {
    Relaxed,
    Concentrated,
}

impl CalibrationCondition {
    pub fn label(&self) -> &'static str {
        match self {
            CalibrationCondition::Relaxed => "relaxed",
            CalibrationCondition::Concentrated => "concentrated",
        }
    }

    /// Get human-readable name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            CalibrationCondition::Relaxed => "RELAXED",
            CalibrationCondition::Concentrated => "CONCENTRATED",
        }
    }
}

/// Features collected during one session; never empty
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationSession {
    condition: CalibrationCondition,
    features: Vec<f64>,
    mean: f64,
    malformed_lines: u64,
}

impl CalibrationSession {
    pub fn condition(&self) -> CalibrationCondition {
        self.condition
    }

    /// Beta energies in the order their windows completed
    pub fn features(&self) -> &[f64] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Arithmetic mean of the session's features
    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn malformed_lines(&self) -> u64 {
        self.malformed_lines
    }
}

/// Both sessions and the threshold derived from them
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationOutcome {
    pub relaxed: CalibrationSession,
    pub concentrated: CalibrationSession,
    pub thresholds: ThresholdConfig,
}

/// Calibrator drives the feature pipeline for fixed-length sessions
pub struct Calibrator<S, C> {
    pipeline: FeaturePipeline,
    source: S,
    clock: C,
}

impl<S: SampleSource, C: Clock> Calibrator<S, C> {
    pub fn new(pipeline: FeaturePipeline, source: S, clock: C) -> Self {
        Self {
            pipeline,
            source,
            clock,
        }
    }

    /// Collect features for `duration` under `condition`
    ///
    /// A stream that closes early ends the session with what it has.
    ///
    /// # Errors
    /// * `CalibrationError::NoWindowsCompleted` - Not one full window in the session
    /// * `CalibrationError::Sensor` - The sensor link failed
    /// * `CalibrationError::InvalidMean` - The mean is not finite
    pub fn run(
        &mut self,
        duration: Duration,
        condition: CalibrationCondition,
    ) -> Result<CalibrationSession, CalibrationError> {
        self.pipeline.reset();
        let started = self.clock.now();
        let mut features = Vec::new();
        let mut malformed_lines = 0;

        log::info!(
            "[Calibration] {} session started for {:.1}s",
            condition.display_name(),
            duration.as_secs_f64()
        );

        while self.clock.now().saturating_sub(started) < duration {
            let reading = self
                .source
                .read()
                .map_err(|err| CalibrationError::Sensor {
                    reason: err.to_string(),
                })?;

            match reading {
                Reading::Sample(value) => {
                    self.clock.on_sample();
                    if let Some(energy) = self.pipeline.push(value) {
                        log::debug!("[Calibration] {} window: beta energy {:.6}", condition.label(), energy);
                        features.push(energy);
                    }
                }
                Reading::Malformed(line) => {
                    malformed_lines += 1;
                    log::debug!("[Calibration] Skipping unparsable line {:?}", line);
                }
                Reading::Idle => {}
                Reading::Closed => {
                    log::warn!(
                        "[Calibration] Sensor stream closed after {:.1}s of {:.1}s",
                        self.clock.now().saturating_sub(started).as_secs_f64(),
                        duration.as_secs_f64()
                    );
                    break;
                }
            }
        }

        if features.is_empty() {
            return Err(CalibrationError::NoWindowsCompleted {
                label: condition.label().to_string(),
                duration_secs: duration.as_secs_f64(),
            });
        }

        let mean = features.iter().sum::<f64>() / features.len() as f64;
        if !mean.is_finite() {
            return Err(CalibrationError::InvalidMean {
                label: condition.label().to_string(),
                mean,
            });
        }

        log::info!(
            "[Calibration] {} average beta energy: {:.6} over {} windows",
            condition.display_name(),
            mean,
            features.len()
        );

        Ok(CalibrationSession {
            condition,
            features,
            mean,
            malformed_lines,
        })
    }

    /// Mean beta energy over one session
    pub fn run_mean(
        &mut self,
        duration: Duration,
        condition: CalibrationCondition,
    ) -> Result<f64, CalibrationError> {
        self.run(duration, condition).map(|session| session.mean())
    }

    /// Run the relaxed then the concentrated session and derive the threshold
    ///
    /// # Arguments
    /// * `duration` - Length of each session
    /// * `before_each` - Called before each session starts (e.g. to prompt the user)
    pub fn calibrate<F>(
        &mut self,
        duration: Duration,
        mut before_each: F,
    ) -> Result<CalibrationOutcome, CalibrationError>
    where
        F: FnMut(CalibrationCondition),
    {
        before_each(CalibrationCondition::Relaxed);
        let relaxed = self.run(duration, CalibrationCondition::Relaxed)?;

        before_each(CalibrationCondition::Concentrated);
        let concentrated = self.run(duration, CalibrationCondition::Concentrated)?;

        let thresholds = ThresholdConfig::from_means(relaxed.mean(), concentrated.mean());
        log::info!("[Calibration] Final threshold: {:.6}", thresholds.threshold());

        Ok(CalibrationOutcome {
            relaxed,
            concentrated,
            thresholds,
        })
    }
}
