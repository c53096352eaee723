//! # Registry Errors
//!
//! Every public operation returns either its success value or one
//! [`RegistryError`]. All errors are terminal: the enclosing transaction is
//! dropped and nothing it staged becomes visible.

use thiserror::Error;

use twin_core::{CanonicalizationError, Principal, ProductId, ValidationError};

use crate::authorization::Action;
use crate::status::ProductStatus;

/// Errors returned by [`TwinService`](crate::TwinService) operations.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The caller failed the authorization check for the action.
    #[error("{caller} is not authorized to {action}")]
    NotAuthorized {
        /// Who attempted the action.
        caller: Principal,
        /// What they attempted.
        action: Action,
    },

    /// The referenced product has no registry entry.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// Creation with an identifier already present.
    #[error("product {0} already exists")]
    AlreadyExists(ProductId),

    /// Status code outside `1..=5`, as the caller sent it.
    #[error("invalid status {0}: expected 1 (MANUFACTURED) through 5 (RETIRED)")]
    InvalidStatus(i64),

    /// Status move refused by the forward-only policy.
    #[error("status transition {from} -> {to} rejected by forward-only policy")]
    TransitionRejected {
        /// Current status.
        from: ProductStatus,
        /// Requested status.
        to: ProductStatus,
    },

    /// Malformed input (identifier length, material count, timestamp range).
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Journal or encoding failure. Nothing was applied.
    #[error("storage fault: {0}")]
    Storage(#[from] StorageError),
}

impl RegistryError {
    /// Stable machine-readable code for logs and wire formats.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotAuthorized { .. } => "NOT_AUTHORIZED",
            Self::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::InvalidStatus(_) => "INVALID_STATUS",
            Self::TransitionRejected { .. } => "TRANSITION_REJECTED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

/// Failures of the journal and of event sealing.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Reading, writing or syncing the journal file failed.
    #[error("journal I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A journal line could not be decoded or is out of sequence.
    #[error("journal corrupt at line {line}: {reason}")]
    Corrupt {
        /// 1-based line number.
        line: usize,
        /// Decoder message.
        reason: String,
    },

    /// The event counter points past the stored events, so the next event
    /// has nothing to chain to.
    #[error("event {event_id} of product {product_id} is missing; refusing to append")]
    MissingPredecessor {
        product_id: ProductId,
        event_id: u64,
    },

    /// The store was created under a different registrar.
    #[error("registrar {configured} does not match {recorded}, the registry's creator")]
    RegistrarMismatch {
        recorded: Principal,
        configured: Principal,
    },

    /// A write-set could not be encoded.
    #[error("failed to encode journal entry: {0}")]
    Encode(String),

    /// An event could not be canonicalized for digesting.
    #[error("failed to seal lifecycle event: {0}")]
    Seal(#[from] CanonicalizationError),
}
