//! The record store boundary.

use pen_types::{ControlNumber, Document};

use crate::error::StoreResult;
use crate::record::Record;

/// Persistent record store.
///
/// All implementations must satisfy these invariants:
/// - Control numbers are assigned monotonically and never reused.
/// - `get` never returns a tombstoned record as live; a tombstoned
///   record with a redirect resolves to the surviving record.
/// - `commit_merge` applies content replacement, redirect, tombstone,
///   and backreference append atomically: no reader ever observes a
///   partial application, and nothing is mutated on rejection.
/// - Identifiers listed in a record's `deleted_records` never appear
///   as live records again.
pub trait RecordStore: Send + Sync {
    /// Insert a new record, assigning the next control number.
    fn insert(&self, data: Document) -> StoreResult<ControlNumber>;

    /// Fetch the live record for an identifier, following redirects.
    ///
    /// Returns `NotFound` for unknown identifiers and for tombstoned
    /// records without a redirect.
    fn get(&self, id: ControlNumber) -> StoreResult<Record>;

    /// Replace the content of a live record.
    fn put(&self, id: ControlNumber, data: Document) -> StoreResult<()>;

    /// Tombstone a record. It is never again returned as live.
    fn delete(&self, id: ControlNumber) -> StoreResult<()>;

    /// Redirect `old` to `new`: subsequent lookups of `old` resolve to
    /// `new`'s record. `new` must be live.
    fn redirect(&self, old: ControlNumber, new: ControlNumber) -> StoreResult<()>;

    /// Atomically commit an approved merge: replace `head`'s content
    /// with `merged`, redirect and tombstone `update`, and append
    /// `update` to `head`'s `deleted_records`.
    ///
    /// Rejects with `AlreadyFinalized` when `update` is already
    /// tombstoned and `NotFound` when either record is absent (or
    /// `head` is no longer live). Nothing is mutated on rejection.
    fn commit_merge(
        &self,
        head: ControlNumber,
        update: ControlNumber,
        merged: Document,
    ) -> StoreResult<()>;
}
