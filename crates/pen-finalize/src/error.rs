//! Errors produced while finalizing a merge.

use pen_roots::RootError;
use pen_store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FinalizeError {
    /// The merge still carries conflicts; resolution must clear them
    /// before the result can be committed.
    #[error("cannot finalize a merge with {0} unresolved conflicts")]
    UnresolvedConflicts(usize),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Root(#[from] RootError),
}

pub type FinalizeResult<T> = Result<T, FinalizeError>;
