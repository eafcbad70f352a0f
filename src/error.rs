//! Error types for snapshot capture and comparison.

use crate::types::{BlockHeight, SnapshotKey};
use alloy_primitives::Address;
use thiserror::Error;

/// Main error type for snapshot operations.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Key not captured in snapshot at block {block}: {key}")]
    MissingKey { key: SnapshotKey, block: BlockHeight },

    #[error("Want mismatch: sett holds {sett}, strategy holds {strategy}")]
    WantMismatch { sett: Address, strategy: Address },

    #[error("Unknown strategy type: {0}")]
    UnknownStrategy(String),

    #[error("Unknown sett key: {0}")]
    UnknownSett(String),

    #[error("Unexpected value for {what}: expected {expected}")]
    UnexpectedValue { what: String, expected: &'static str },

    #[error("Duplicate snapshot key in batch: {0}")]
    DuplicateKey(SnapshotKey),

    #[error("Batch returned {got} values for {expected} calls")]
    BatchMismatch { expected: usize, got: usize },

    #[error("Invalid snapshot key: {0}")]
    InvalidKey(String),

    #[error("Chain error: {0}")]
    Chain(String),

    #[error("Transaction reverted: {0}")]
    Reverted(String),

    #[error("Confirmation of {action} failed: {check}")]
    ConfirmationFailed { action: &'static str, check: String },

    #[error("Arithmetic overflow: {0}")]
    Overflow(String),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for SnapshotError {
    fn from(e: serde_json::Error) -> Self {
        SnapshotError::Serialization(e.to_string())
    }
}

impl From<alloy_primitives::utils::UnitsError> for SnapshotError {
    fn from(e: alloy_primitives::utils::UnitsError) -> Self {
        SnapshotError::Format(e.to_string())
    }
}

/// Result type for snapshot operations.
pub type Result<T> = std::result::Result<T, SnapshotError>;
