//! Workflow objects and their side-channel state.

use chrono::{DateTime, Utc};
use pen_merge::Conflict;
use pen_types::{Document, ObjectId, ObjectStatus, Source};
use serde::{Deserialize, Serialize};

use crate::checkpoint::Checkpoint;

/// Where and why a step failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureInfo {
    pub step: String,
    pub message: String,
}

/// An operator decision delivered to a halted object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub approved: bool,
    pub reason: Option<String>,
}

impl Verdict {
    pub fn approve() -> Self {
        Self {
            approved: true,
            reason: None,
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            approved: false,
            reason: Some(reason.into()),
        }
    }
}

/// Processing state carried alongside the record payload.
///
/// Steps communicate through this structure rather than through the
/// record itself, so the payload stays a faithful candidate record.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExtraData {
    /// Where the record came from.
    pub source: Option<Source>,
    /// The record matched something already persisted.
    #[serde(default)]
    pub is_update: bool,
    /// The record matched an in-flight object.
    #[serde(default)]
    pub already_in_pen: bool,
    /// The matched in-flight object had been rejected before.
    #[serde(default)]
    pub previously_rejected: bool,
    /// Identifier of the matched in-flight object, when one matched.
    #[serde(default)]
    pub matched_object: Option<ObjectId>,
    /// The matched in-flight object came from the same source.
    #[serde(default)]
    pub matched_same_source: bool,
    /// Set on an object another object stopped.
    #[serde(default)]
    pub stopped_by: Option<ObjectId>,
    /// Operator decision from the last resumption, if any.
    #[serde(default)]
    pub approved: Option<bool>,
    #[serde(default)]
    pub approval_reason: Option<String>,
    /// Control number of the record chosen as merge head.
    #[serde(default)]
    pub head_id: Option<pen_types::ControlNumber>,
    /// Control number of the record merged away, for manual merges.
    #[serde(default)]
    pub update_id: Option<pen_types::ControlNumber>,
    /// Source whose root anchors the three-way merge.
    #[serde(default)]
    pub head_source: Option<Source>,
    /// Root snapshot to persist when the merge is committed.
    #[serde(default)]
    pub pending_root: Option<Document>,
    /// Conflicts left over from the last merge.
    #[serde(default)]
    pub conflicts: Vec<Conflict>,
    /// Opaque key an external callback must present to resume a wait.
    #[serde(default)]
    pub callback_key: Option<String>,
    /// Which approval a halt is asking for.
    #[serde(default)]
    pub halt_action: Option<String>,
    #[serde(default)]
    pub halt_message: Option<String>,
    /// Populated when the object enters the error state.
    #[serde(default)]
    pub failure: Option<FailureInfo>,
}

impl ExtraData {
    pub fn new(source: Source) -> Self {
        Self {
            source: Some(source),
            ..Self::default()
        }
    }
}

/// One record moving through a pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowObject {
    pub id: ObjectId,
    /// Name of the pipeline this object runs.
    pub pipeline: String,
    /// The candidate record payload.
    pub data: Document,
    pub extra: ExtraData,
    pub status: ObjectStatus,
    pub checkpoint: Checkpoint,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowObject {
    pub fn new(pipeline: impl Into<String>, data: Document, extra: ExtraData) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            pipeline: pipeline.into(),
            data,
            extra,
            status: ObjectStatus::Running,
            checkpoint: Checkpoint::start(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Bump the update timestamp. Called on every persisted mutation.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// The source recorded at creation, if any.
    pub fn source(&self) -> Option<&Source> {
        self.extra.source.as_ref()
    }
}
