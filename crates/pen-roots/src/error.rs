//! Errors produced by root store operations.

/// Errors produced by root store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RootError {
    #[error("root store lock poisoned: {0}")]
    Lock(String),
}

/// Result alias for root store operations.
pub type RootResult<T> = Result<T, RootError>;
