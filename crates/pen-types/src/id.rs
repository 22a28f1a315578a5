//! Record and workflow-object identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persistent identity of a stored record.
///
/// Control numbers are assigned monotonically by the record store and
/// never reused. A retired record's control number survives only in the
/// surviving record's `deleted_records` backreference list.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ControlNumber(pub u64);

impl ControlNumber {
    /// The raw numeric value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ControlNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ControlNumber {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// The canonical reference URL embedded in record documents when one
/// record points at another (`new_record`, `deleted_records` entries).
pub fn record_ref(control_number: ControlNumber) -> String {
    format!("/api/records/{control_number}")
}

/// Identifier of an in-flight workflow object.
///
/// UUID v7: time-ordered, so the id order of two objects reflects their
/// ingestion order. The symmetric-match tie-break relies on this
/// ordering being total.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Generate a fresh time-ordered id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
