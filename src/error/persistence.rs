// Threshold file errors

use crate::error::ErrorCode;
use std::fmt;

/// Persistence error code constants
///
/// Error code range: 3001-3003
pub struct PersistenceErrorCodes {}

impl PersistenceErrorCodes {
    /// Threshold file does not exist or cannot be read
    pub const MISSING: i32 = 3001;

    /// Threshold file is not a valid threshold record
    pub const CORRUPT: i32 = 3002;

    /// Threshold file could not be written
    pub const WRITE_FAILED: i32 = 3003;
}

/// Threshold persistence faults
///
/// Missing or corrupt thresholds are fatal at run-time startup: the control
/// loop cannot decide anything without a threshold.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistenceError {
    Missing { path: String, reason: String },
    Corrupt { path: String, reason: String },
    WriteFailed { path: String, reason: String },
}

impl ErrorCode for PersistenceError {
    fn code(&self) -> i32 {
        match self {
            PersistenceError::Missing { .. } => PersistenceErrorCodes::MISSING,
            PersistenceError::Corrupt { .. } => PersistenceErrorCodes::CORRUPT,
            PersistenceError::WriteFailed { .. } => PersistenceErrorCodes::WRITE_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            PersistenceError::Missing { path, reason } => {
                format!("Threshold file {} unreadable: {}. Run calibration first.", path, reason)
            }
            PersistenceError::Corrupt { path, reason } => {
                format!("Threshold file {} is corrupt: {}", path, reason)
            }
            PersistenceError::WriteFailed { path, reason } => {
                format!("Failed to write threshold file {}: {}", path, reason)
            }
        }
    }
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PersistenceError (code {}): {}",
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for PersistenceError {}
