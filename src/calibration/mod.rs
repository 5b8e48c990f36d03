// Calibration module - labeled sessions and threshold storage
//
// This module provides two main components:
// 1. Calibrator: runs timed sessions and reduces each to a mean beta energy
// 2. ThresholdConfig: the persisted relaxed/concentrated means and midpoint
//
// The calibration workflow:
// 1. Collect beta energies while the user is relaxed
// 2. Collect beta energies while the user concentrates
// 3. Save the midpoint of the two means as the decision threshold

pub mod procedure;
pub mod state;

pub use procedure::{CalibrationCondition, CalibrationOutcome, CalibrationSession, Calibrator};
pub use state::ThresholdConfig;
