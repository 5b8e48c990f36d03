// Runtime - the single-threaded control loop
//
// One iteration reads one raw sample. Every completed window is reduced to a
// beta energy, evaluated by the state machine at the clock's current time,
// and any resulting commands are written to the actuator (Move before Stop).
// Actuator writes are fire-and-forget: a failed write is logged, not retried.
//
// The loop ends only when the sensor stream closes or fails; it sends no
// final Stop on its own.

use serde::Serialize;

use crate::analysis::FeaturePipeline;
use crate::calibration::ThresholdConfig;
use crate::config::AppConfig;
use crate::control::{Command, ControlState, ControlStateMachine};
use crate::error::{ConfigError, LinkError};
use crate::link::{Clock, CommandSink, Reading, SampleSource};

/// What happened to one completed window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowReport {
    /// 1-based window counter
    pub index: u64,
    /// Clock time when the window completed
    pub at_secs: f64,
    pub beta_energy: f64,
    /// Discarded as a spike
    pub rejected: bool,
    pub commands: Vec<Command>,
}

/// Outcome of one loop iteration
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Idle,
    Malformed,
    Sample,
    Window(WindowReport),
    Closed,
}

/// Running totals for status output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoopSummary {
    pub samples: u64,
    pub windows: u64,
    pub moves: u64,
    pub stops: u64,
    pub spikes: u64,
    pub malformed_lines: u64,
}

/// ControlLoop wires pipeline, state machine and actuator together
pub struct ControlLoop<K> {
    pipeline: FeaturePipeline,
    machine: ControlStateMachine,
    sink: K,
    summary: LoopSummary,
}

impl<K: CommandSink> ControlLoop<K> {
    pub fn new(config: &AppConfig, thresholds: &ThresholdConfig, sink: K) -> Result<Self, ConfigError> {
        config.control.validate()?;
        Ok(Self {
            pipeline: FeaturePipeline::new(&config.dsp)?,
            machine: ControlStateMachine::from_config(thresholds.threshold(), &config.control),
            sink,
            summary: LoopSummary::default(),
        })
    }

    pub fn summary(&self) -> LoopSummary {
        self.summary
    }

    pub fn state(&self) -> &ControlState {
        self.machine.state()
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn into_sink(self) -> K {
        self.sink
    }

    /// Read one sample and act on it
    ///
    /// # Errors
    /// Only a fatal `LinkError` from the sensor; transient faults are `Step::Idle`
    pub fn step<S, C>(&mut self, source: &mut S, clock: &mut C) -> Result<Step, LinkError>
    where
        S: SampleSource,
        C: Clock,
    {
        let value = match source.read()? {
            Reading::Sample(value) => value,
            Reading::Malformed(line) => {
                self.summary.malformed_lines += 1;
                tracing::debug!("[Control] Skipping unparsable line {:?}", line);
                return Ok(Step::Malformed);
            }
            Reading::Idle => return Ok(Step::Idle),
            Reading::Closed => return Ok(Step::Closed),
        };

        self.summary.samples += 1;
        clock.on_sample();
        let Some(beta_energy) = self.pipeline.push(value) else {
            return Ok(Step::Sample);
        };

        self.summary.windows += 1;
        let now = clock.now();
        let previous = self.machine.state().last_feature;
        let decision = self.machine.on_feature(beta_energy, now);

        if decision.rejected {
            self.summary.spikes += 1;
            tracing::warn!(
                "[Control] Spike ignored (current: {:.2}, last: {:.2})",
                beta_energy,
                previous.unwrap_or(f64::NAN)
            );
        } else {
            tracing::debug!("[Control] Beta energy: {:.6}", beta_energy);
        }

        let commands: Vec<Command> = decision.commands().collect();
        for &command in &commands {
            match command {
                Command::Move => {
                    self.summary.moves += 1;
                    tracing::info!("[Control] Moving forward (sent 'F')");
                }
                Command::Stop => {
                    self.summary.stops += 1;
                    tracing::info!("[Control] Auto-stopped after move duration (sent 'S')");
                }
            }
            if let Err(err) = self.sink.send(command) {
                tracing::warn!("[Control] Failed to send {:?} to actuator: {}", command, err);
            }
        }

        Ok(Step::Window(WindowReport {
            index: self.summary.windows,
            at_secs: now.as_secs_f64(),
            beta_energy,
            rejected: decision.rejected,
            commands,
        }))
    }

    /// Loop until the sensor closes
    ///
    /// `on_window` sees every completed window in order.
    pub fn run<S, C, F>(&mut self, source: &mut S, clock: &mut C, mut on_window: F) -> Result<LoopSummary, LinkError>
    where
        S: SampleSource,
        C: Clock,
        F: FnMut(&WindowReport),
    {
        loop {
            match self.step(source, clock)? {
                Step::Window(report) => on_window(&report),
                Step::Closed => {
                    tracing::info!("[Control] Sensor stream closed: {:?}", self.summary);
                    return Ok(self.summary);
                }
                Step::Idle | Step::Malformed | Step::Sample => {}
            }
        }
    }
}
