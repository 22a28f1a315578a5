//! Finalization of approved merges.
//!
//! An approved merge turns two live records into one: the head keeps
//! its identity and takes the merged content, the update is
//! tombstoned and redirected to the head, and the head records the
//! retired identifier. The record mutation is delegated to
//! [`pen_store::RecordStore::commit_merge`] so it lands atomically;
//! this crate adds the preconditions and the source-root snapshots
//! that seed the next merge from either source.

pub mod error;
pub mod finalize;

pub use error::{FinalizeError, FinalizeResult};
pub use finalize::finalize;
