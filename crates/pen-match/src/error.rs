//! Errors produced by matching operations.

/// Errors produced by matching operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("duplicate index query failed: {0}")]
    Index(String),

    #[error("persisted record lookup failed: {0}")]
    Persisted(String),

    #[error("matcher lock poisoned: {0}")]
    Lock(String),
}

/// Result alias for matching operations.
pub type MatchResult<T> = Result<T, MatchError>;
