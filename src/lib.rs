// Beta Drive Core - EEG beta-band threshold control
// Zero-phase filtering, Welch band energy, calibration and debounced commands

pub mod analysis;
pub mod calibration;
pub mod config;
pub mod control;
pub mod error;
pub mod link;
pub mod runtime;

// Re-exports for convenience
pub use analysis::FeaturePipeline;
pub use calibration::{CalibrationCondition, Calibrator, ThresholdConfig};
pub use config::AppConfig;
pub use control::{Command, ControlStateMachine, Decision};
pub use runtime::{ControlLoop, LoopSummary, WindowReport};
