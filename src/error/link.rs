// Serial link errors

use crate::error::ErrorCode;
use std::fmt;

/// Link error code constants
///
/// Error code range: 4001-4002
pub struct LinkErrorCodes {}

impl LinkErrorCodes {
    /// Serial port could not be opened
    pub const OPEN_FAILED: i32 = 4001;

    /// Channel failed in a way a retry cannot fix
    pub const DISCONNECTED: i32 = 4002;
}

/// Fatal link faults
///
/// Read timeouts and garbled lines are not errors; see `link::Reading`.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkError {
    /// Failed to open a serial port
    OpenFailed { port: String, reason: String },

    /// Device vanished or the stream broke irrecoverably
    Disconnected { reason: String },
}

impl ErrorCode for LinkError {
    fn code(&self) -> i32 {
        match self {
            LinkError::OpenFailed { .. } => LinkErrorCodes::OPEN_FAILED,
            LinkError::Disconnected { .. } => LinkErrorCodes::DISCONNECTED,
        }
    }

    fn message(&self) -> String {
        match self {
            LinkError::OpenFailed { port, reason } => {
                format!("Failed to open serial port {}: {}", port, reason)
            }
            LinkError::Disconnected { reason } => format!("Link disconnected: {}", reason),
        }
    }
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LinkError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for LinkError {}
