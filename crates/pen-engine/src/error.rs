//! Errors produced by the pipeline engine.

use pen_types::{ObjectId, ObjectStatus};

/// Failure raised by a single step.
///
/// Steps wrap whatever went wrong into a message; the engine attaches
/// the failing step's identity when it records the failure on the
/// object.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct StepError(pub String);

impl StepError {
    /// Create a step error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// Wrap any displayable error.
    pub fn wrap(error: impl std::fmt::Display) -> Self {
        Self(error.to_string())
    }
}

/// Errors produced by engine operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("pipeline `{0}` is not registered")]
    UnknownPipeline(String),

    #[error("workflow object {0} not found")]
    NotFound(ObjectId),

    #[error("step `{step}` failed: {message}")]
    StepFailed { step: String, message: String },

    /// The object is no longer awaiting what the caller tried to
    /// deliver: it was concurrently stopped, completed, or failed.
    /// Distinct from [`EngineError::StepFailed`] so callers can tell
    /// "already handled" from "broken".
    #[error("object {id} is {status}, not {expected}")]
    StaleResumption {
        id: ObjectId,
        status: ObjectStatus,
        expected: &'static str,
    },

    #[error("no waiting object for callback key `{0}`")]
    UnknownCallback(String),

    #[error("persisted checkpoint does not match the pipeline definition")]
    CorruptCheckpoint,

    #[error("object storage error: {0}")]
    Storage(String),
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
