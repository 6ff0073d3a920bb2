//! # Error Types
//!
//! Errors raised by the foundational types. Higher layers wrap these with
//! `#[from]` so the original cause stays inspectable.

use thiserror::Error;

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Validation errors for identifier newtypes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Card identifier is not a 64-character hex SHA-256 digest.
    #[error("invalid card id: \"{0}\" (expected 64 hex characters)")]
    InvalidCardId(String),
}
