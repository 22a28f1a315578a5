//! The conflict data model shared by the merge engine and the
//! workflow layer that persists conflicts for human review.

use pen_types::Document;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The result of a three-way merge: a merged document plus every
/// conflict detected along the way, in detection order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeResult {
    /// The merged document. At conflicted paths it retains `head`'s
    /// value, so an unresolved conflict never silently prefers the
    /// update.
    pub merged: Document,
    /// Detected conflicts, in detection order. May be empty.
    pub conflicts: Vec<Conflict>,
}

impl MergeResult {
    /// Returns `true` if the merge produced no conflicts.
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Number of conflicts.
    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }
}

/// The kind of disagreement at a conflicted path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Both sides changed a field to different values.
    FieldValue,
    /// Both sides changed (or both added) a keyed list item, with
    /// different content.
    ListItem,
    /// One side removed a value the other side modified.
    Removal,
}

/// A single field-level conflict.
///
/// A conflict is a structural fact about two documents, not advice on
/// resolution: it records the path and both competing values, and
/// resolution happens elsewhere.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    /// Slash-joined path to the disagreeing value. List items
    /// contribute their reconciliation key as a segment.
    pub path: String,
    /// What kind of disagreement this is.
    pub kind: ConflictKind,
    /// `head`'s value at the path, `None` when head removed it.
    pub head: Option<Value>,
    /// `update`'s value at the path, `None` when the update removed it.
    pub update: Option<Value>,
}

impl Conflict {
    /// Create a conflict record.
    pub fn new(
        path: impl Into<String>,
        kind: ConflictKind,
        head: Option<Value>,
        update: Option<Value>,
    ) -> Self {
        Self {
            path: path.into(),
            kind,
            head,
            update,
        }
    }
}
