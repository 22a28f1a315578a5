//! The stored record type.

use pen_types::{ControlNumber, Document};
use serde::{Deserialize, Serialize};

/// A stored bibliographic record plus its storage-level metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Persistent record identity.
    pub control_number: ControlNumber,
    /// The record's document content.
    pub data: Document,
    /// Tombstone flag. Tombstoned records are never returned as live.
    pub deleted: bool,
    /// Redirect target: set when this record was retired in favor of
    /// another, so lookups under this identity resolve to the survivor.
    pub new_record: Option<ControlNumber>,
    /// Identifiers of records retired in this record's favor.
    /// Append-only and duplicate-free.
    pub deleted_records: Vec<ControlNumber>,
}

impl Record {
    /// Create a fresh live record.
    pub fn new(control_number: ControlNumber, data: Document) -> Self {
        Self {
            control_number,
            data,
            deleted: false,
            new_record: None,
            deleted_records: Vec::new(),
        }
    }

    /// Returns `true` if the record is live (not tombstoned).
    pub fn is_live(&self) -> bool {
        !self.deleted
    }
}
