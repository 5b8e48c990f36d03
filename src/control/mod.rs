// Control module - turns the beta-energy stream into move/stop commands
//
// Evaluated once per completed window. Per feature, in order:
// 1. spike rejection: a jump larger than the spike limit from the last
//    accepted feature is discarded without touching any state
// 2. rising edge: above threshold with the latch open -> Move, latch closes
// 3. auto-stop: moving for at least the move duration -> Stop
// 4. latch reset: below threshold re-opens the latch
// 5. the feature becomes `last_feature`
//
// A sustained above-threshold signal therefore yields one Move/Stop pulse
// per hysteresis cycle; the latch only re-opens after the feature dips below
// the threshold.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ControlConfig;

/// Single-byte actuator commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    Move,
    Stop,
}

impl Command {
    /// Wire byte understood by the actuator
    pub const fn as_byte(self) -> u8 {
        match self {
            Command::Move => b'F',
            Command::Stop => b'S',
        }
    }
}

/// Mutable run-time state, owned by the state machine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlState {
    pub moving: bool,
    /// Hysteresis latch: set by a Move, cleared when the feature drops below threshold
    pub beta_high: bool,
    pub last_feature: Option<f64>,
    pub last_command_time: Option<Duration>,
}

/// Outcome of evaluating one feature
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Decision {
    /// Feature was discarded as a spike (or was not a finite number)
    pub rejected: bool,
    pub moved: bool,
    pub stopped: bool,
}

impl Decision {
    /// Emitted commands, Move before Stop
    pub fn commands(&self) -> impl Iterator<Item = Command> {
        self.moved
            .then_some(Command::Move)
            .into_iter()
            .chain(self.stopped.then_some(Command::Stop))
    }
}

/// ControlStateMachine applies spike rejection, hysteresis and auto-stop
#[derive(Debug, Clone)]
pub struct ControlStateMachine {
    threshold: f64,
    spike_limit: f64,
    move_duration: Duration,
    state: ControlState,
}

impl ControlStateMachine {
    pub fn new(threshold: f64, spike_limit: f64, move_duration: Duration) -> Self {
        Self {
            threshold,
            spike_limit,
            move_duration,
            state: ControlState::default(),
        }
    }

    pub fn from_config(threshold: f64, control: &ControlConfig) -> Self {
        Self::new(threshold, control.spike_limit, control.move_duration())
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    /// Evaluate one feature produced at `now`
    pub fn on_feature(&mut self, feature: f64, now: Duration) -> Decision {
        if !feature.is_finite() {
            log::warn!("[Control] Ignoring non-finite feature {}", feature);
            return Decision {
                rejected: true,
                ..Decision::default()
            };
        }

        if let Some(last) = self.state.last_feature {
            if (feature - last).abs() > self.spike_limit {
                return Decision {
                    rejected: true,
                    ..Decision::default()
                };
            }
        }

        let mut decision = Decision::default();

        if feature > self.threshold && !self.state.beta_high {
            decision.moved = true;
            self.state.last_command_time = Some(now);
            self.state.moving = true;
            self.state.beta_high = true;
        }

        if self.state.moving {
            let engaged_for = self
                .state
                .last_command_time
                .map(|started| now.saturating_sub(started))
                .unwrap_or_default();
            if engaged_for >= self.move_duration {
                decision.stopped = true;
                self.state.moving = false;
            }
        }

        if feature < self.threshold {
            self.state.beta_high = false;
        }

        self.state.last_feature = Some(feature);
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn machine(threshold: f64) -> ControlStateMachine {
        ControlStateMachine::new(threshold, 50.0, Duration::from_secs(3))
    }

    #[test]
    fn test_command_bytes() {
        assert_eq!(Command::Move.as_byte(), b'F');
        assert_eq!(Command::Stop.as_byte(), b'S');
    }

    #[test]
    fn test_spike_never_updates_last_feature() {
        let mut machine = machine(100.0);
        let mut moves = 0;
        for (i, feature) in [10.0, 10.0, 10.0, 200.0, 10.0].into_iter().enumerate() {
            let decision = machine.on_feature(feature, secs(i as u64));
            if feature == 200.0 {
                assert!(decision.rejected);
                assert_eq!(machine.state().last_feature, Some(10.0));
            }
            moves += decision.commands().filter(|c| *c == Command::Move).count();
        }
        assert_eq!(moves, 0);
        assert!(!machine.state().moving);
    }

    #[test]
    fn test_first_feature_is_never_a_spike() {
        let mut machine = machine(100.0);
        let decision = machine.on_feature(500.0, secs(0));
        assert!(!decision.rejected);
        assert!(decision.moved);
    }

    #[test]
    fn test_sustained_high_gives_single_pulse() {
        let mut machine = machine(20.0);
        let mut emitted = Vec::new();
        for t in 0..10 {
            let decision = machine.on_feature(30.0, secs(t));
            emitted.extend(decision.commands().map(|c| (t, c)));
        }
        assert_eq!(emitted, vec![(0, Command::Move), (3, Command::Stop)]);
        assert!(machine.state().beta_high);
        assert!(!machine.state().moving);
    }

    #[test]
    fn test_dip_below_threshold_rearms_trigger() {
        let mut machine = machine(20.0);
        assert!(machine.on_feature(30.0, secs(0)).moved);
        assert!(!machine.on_feature(30.0, secs(1)).moved);
        assert!(!machine.on_feature(10.0, secs(2)).moved);
        assert!(!machine.state().beta_high);
        let decision = machine.on_feature(30.0, secs(3));
        // Re-trigger restarts the timer, so no stop in the same call
        assert!(decision.moved);
        assert!(!decision.stopped);
        assert_eq!(machine.state().last_command_time, Some(secs(3)));
    }

    #[test]
    fn test_feature_equal_to_threshold_keeps_latch() {
        let mut machine = machine(20.0);
        machine.on_feature(30.0, secs(0));
        machine.on_feature(20.0, secs(1));
        assert!(machine.state().beta_high);
        assert!(!machine.on_feature(30.0, secs(2)).moved);
    }

    #[test]
    fn test_auto_stop_never_early() {
        let mut machine = machine(20.0);
        assert!(machine.on_feature(30.0, Duration::from_millis(500)).moved);
        assert!(!machine.on_feature(5.0, Duration::from_millis(1500)).stopped);
        assert!(!machine.on_feature(5.0, Duration::from_millis(3499)).stopped);
        assert!(machine.on_feature(5.0, Duration::from_millis(3500)).stopped);
        // Exactly one stop
        assert!(!machine.on_feature(5.0, Duration::from_millis(4500)).stopped);
    }

    #[test]
    fn test_move_and_stop_in_same_call() {
        let mut machine = ControlStateMachine::new(20.0, 50.0, Duration::ZERO);
        let decision = machine.on_feature(30.0, secs(1));
        assert_eq!(
            decision.commands().collect::<Vec<_>>(),
            vec![Command::Move, Command::Stop]
        );
        assert!(!machine.state().moving);
    }

    #[test]
    fn test_non_finite_feature_rejected() {
        let mut machine = machine(20.0);
        machine.on_feature(10.0, secs(0));
        assert!(machine.on_feature(f64::NAN, secs(1)).rejected);
        assert_eq!(machine.state().last_feature, Some(10.0));
    }

    #[test]
    fn test_command_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Command::Move).unwrap(), "\"move\"");
    }
}
