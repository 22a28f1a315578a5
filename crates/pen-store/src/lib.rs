//! Persistent record store for the holding-pen ingestion workflows.
//!
//! Records are identified by a monotonically-assigned
//! [`ControlNumber`](pen_types::ControlNumber). Deletion is always a
//! tombstone: the record stops being queryable as a live record, and
//! when it was retired in favor of another record a redirect makes any
//! lookup under the old identity resolve to the survivor.
//!
//! The [`RecordStore::commit_merge`] operation is the single atomic
//! read-modify-write the manual-merge finalizer builds on: content
//! replacement, redirect, tombstone, and backreference append happen
//! in one critical section or not at all.

pub mod error;
pub mod memory;
pub mod record;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryRecordStore;
pub use record::Record;
pub use traits::RecordStore;
