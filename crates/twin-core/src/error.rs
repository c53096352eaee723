//! # Error Hierarchy
//!
//! Structured error types for the foundational layer, built with `thiserror`.
//! Validation errors carry the rejected input so operators can diagnose a
//! bad request without guesswork.

use thiserror::Error;

/// Top-level error type for `twin-core`.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Canonicalization failure during digest computation.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Domain primitive validation failure.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Errors during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed during canonicalization.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Validation errors for domain primitives and product metadata.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Product identifier is empty or longer than the maximum.
    #[error("invalid product id {value:?}: must be 1..={max} bytes, got {len}")]
    InvalidProductId {
        /// The rejected identifier.
        value: String,
        /// Its length in bytes.
        len: usize,
        /// The maximum permitted length.
        max: usize,
    },

    /// Principal is empty, blank, or longer than the maximum.
    #[error("invalid principal {0:?}: must be non-blank and at most 256 bytes")]
    InvalidPrincipal(String),

    /// More materials were supplied than a product may carry.
    #[error("too many materials: {count} (maximum {max})")]
    TooManyMaterials {
        /// Number supplied.
        count: usize,
        /// Maximum permitted.
        max: usize,
    },

    /// Timestamp string is not valid UTC RFC 3339, or arithmetic overflowed.
    #[error("invalid timestamp: {value:?} ({reason})")]
    InvalidTimestamp {
        /// The input that failed.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}
