//! Errors produced by record store operations.

use pen_types::ControlNumber;

/// Errors produced by record store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record {0} not found")]
    NotFound(ControlNumber),

    #[error("record {update} was already merged into {head}")]
    AlreadyFinalized {
        head: ControlNumber,
        update: ControlNumber,
    },

    #[error("cannot merge record {0} into itself")]
    SelfMerge(ControlNumber),

    #[error("redirect target {0} is not a live record")]
    BadRedirectTarget(ControlNumber),

    #[error("store lock poisoned: {0}")]
    Lock(String),
}

/// Result alias for record store operations.
pub type StoreResult<T> = Result<T, StoreError>;
