//! Match outcome types driving pipeline branching.

use pen_types::{ControlNumber, ObjectId, ObjectStatus, Source};
use serde::{Deserialize, Serialize};

/// Whether the matched in-flight object is still pending or was
/// already terminally rejected by a curator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateOutcome {
    /// Still in the holding pen, awaiting a decision.
    Pending,
    /// Previously reviewed and rejected.
    PreviouslyRejected,
}

/// A candidate returned by the duplicate index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InFlightEntry {
    /// The candidate workflow object.
    pub object_id: ObjectId,
    /// The candidate's current status.
    pub status: ObjectStatus,
    /// The provenance source of the candidate's document.
    pub source: Source,
    /// `true` when the candidate finished as terminally rejected.
    pub previously_rejected: bool,
}

/// Classification of an incoming document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum MatchOutcome {
    /// A fresh ingestion: no equivalent record or object anywhere.
    NoMatch,
    /// An equivalent object is in the holding pen.
    MatchedInFlight {
        /// The matched object.
        object_id: ObjectId,
        /// Whether the matched object came from the same source.
        same_source: bool,
        /// Whether the matched object was already terminally rejected.
        outcome: CandidateOutcome,
    },
    /// An equivalent record is already finalized in the store; the
    /// incoming document is an update to it.
    MatchedPersisted {
        /// The matched record.
        record: ControlNumber,
    },
}

impl MatchOutcome {
    /// Returns `true` for the update/merge path.
    pub fn is_update(&self) -> bool {
        matches!(self, MatchOutcome::MatchedPersisted { .. })
    }
}
