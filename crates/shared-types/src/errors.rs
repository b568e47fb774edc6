//! # Error Types
//!
//! Errors shared across subsystems.

use thiserror::Error;

/// Errors raised while producing or parsing content hashes.
#[derive(Debug, Clone, Error)]
pub enum HashingError {
    /// The value could not be represented as JSON.
    #[error("Value is not JSON-serializable: {0}")]
    NotSerializable(String),

    /// A hex digest had the wrong length or alphabet.
    #[error("Invalid hex digest: {0}")]
    InvalidHex(String),
}

impl From<serde_json::Error> for HashingError {
    fn from(err: serde_json::Error) -> Self {
        HashingError::NotSerializable(err.to_string())
    }
}
