//! Committing an approved merge.

use pen_merge::Conflict;
use pen_roots::RootStore;
use pen_store::RecordStore;
use pen_types::{ControlNumber, Document, Source};
use tracing::info;

use crate::error::{FinalizeError, FinalizeResult};

/// Commit an approved merge of `update` into `head`.
///
/// The record mutation goes through [`RecordStore::commit_merge`], so
/// content replacement, redirect, tombstone, and backreference land
/// atomically or not at all. Afterwards the head's pre-merge document
/// becomes the root for `head_source` and, when the contributing
/// source differs, the update's pre-merge document becomes the root
/// for `update_source`. Both snapshots attach to the surviving record
/// and hold raw source-side content, never the merge output.
///
/// Refuses to commit while `conflicts` is non-empty; a second
/// finalize of the same pair fails with `AlreadyFinalized` and
/// mutates nothing.
pub fn finalize(
    records: &dyn RecordStore,
    roots: &dyn RootStore,
    head: ControlNumber,
    update: ControlNumber,
    merged: Document,
    head_source: &Source,
    update_source: &Source,
    conflicts: &[Conflict],
) -> FinalizeResult<()> {
    if !conflicts.is_empty() {
        return Err(FinalizeError::UnresolvedConflicts(conflicts.len()));
    }

    // Snapshot both sides before the commit replaces the head and
    // tombstones the update. On a repeat finalize the update lookup
    // follows the redirect and returns the head, but commit_merge
    // rejects before anything is written.
    let head_record = records.get(head)?;
    let update_record = records.get(update)?;

    records.commit_merge(head, update, merged)?;
    info!(%head, %update, "merge committed");

    roots.put_root(head, head_source, head_record.data)?;
    if update_source != head_source {
        roots.put_root(head, update_source, update_record.data)?;
    }
    Ok(())
}
