// Error types for the beta-drive pipeline
//
// This module defines custom error types for configuration, calibration,
// threshold persistence and serial links, providing structured error
// handling with numeric codes so the CLI can report failures consistently.
//
// Transient sensor faults (timeouts, malformed lines) are deliberately not
// represented here: they surface as `link::Reading` variants and never
// abort a loop.

mod calibration;
mod config;
mod link;
mod persistence;

pub use calibration::{log_calibration_error, CalibrationError, CalibrationErrorCodes};
pub use config::{ConfigError, ConfigErrorCodes};
pub use link::{LinkError, LinkErrorCodes};
pub use persistence::{PersistenceError, PersistenceErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent reporting at the CLI edge.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
