//! The pipeline steps.
//!
//! Each constructor closes over the service handles it needs and
//! returns a [`Step`] ready to be placed in a pipeline. Steps talk to
//! each other only through the object's `extra` state.

use std::sync::Arc;

use pen_engine::{action, branch, halt, Advance, Step, StepError, WorkflowObject};
use pen_match::{classify, CandidateOutcome, MatchOutcome};
use pen_merge::merge;
use pen_roots::head_source;
use pen_types::Source;
use tracing::{debug, info};

use crate::services::Services;

/// A pluggable relevance predicate for the approval gate.
pub type Relevance = Arc<dyn Fn(&WorkflowObject) -> bool + Send + Sync>;

fn require_source(object: &WorkflowObject) -> Result<Source, StepError> {
    object
        .extra
        .source
        .clone()
        .ok_or_else(|| StepError::new("workflow object has no source"))
}

/// Classify the incoming document against the persisted store and the
/// holding pen, recording the outcome in `extra`.
pub fn classify_document(services: &Services) -> Step {
    let index = services.index.clone();
    let matcher = services.matcher.clone();
    let roots = services.roots.clone();
    action("classify_document", move |object: &mut WorkflowObject| {
        let source = require_source(object)?;
        let entries: Vec<_> = index
            .find_matches(&object.data)
            .map_err(StepError::wrap)?
            .into_iter()
            .filter(|e| e.object_id != object.id)
            .collect();
        let outcome =
            classify(&object.data, &source, matcher.as_ref(), &entries).map_err(StepError::wrap)?;
        match outcome {
            MatchOutcome::NoMatch => {}
            MatchOutcome::MatchedInFlight {
                object_id,
                same_source,
                outcome,
            } => {
                object.extra.already_in_pen = true;
                object.extra.matched_object = Some(object_id);
                object.extra.matched_same_source = same_source;
                object.extra.previously_rejected =
                    outcome == CandidateOutcome::PreviouslyRejected;
            }
            MatchOutcome::MatchedPersisted { record } => {
                object.extra.is_update = true;
                object.extra.head_id = Some(record);
                object.extra.head_source =
                    head_source(roots.as_ref(), record).map_err(StepError::wrap)?;
            }
        }
        Ok(Advance::Continue)
    })
}

/// Act on an in-flight match: a previously rejected twin kills the
/// ingestion outright, and a different-source twin keeps both objects
/// alive. For a same-source twin the object with the lower id yields,
/// so exactly one of the pair survives no matter which side sees the
/// match first.
pub fn resolve_in_flight_match(services: &Services) -> Step {
    let objects = services.objects.clone();
    action("resolve_in_flight_match", move |object: &mut WorkflowObject| {
        if !object.extra.already_in_pen {
            return Ok(Advance::Continue);
        }
        if object.extra.previously_rejected {
            info!(object = %object.id, "document was previously rejected, dropping");
            return Ok(Advance::StopProcessing);
        }
        if object.extra.matched_same_source {
            if let Some(twin) = object.extra.matched_object {
                if twin < object.id {
                    let stopped =
                        pen_engine::stop_object(objects.as_ref(), &twin, Some(object.id))
                            .map_err(StepError::wrap)?;
                    info!(
                        object = %object.id,
                        superseded = %twin,
                        stopped,
                        "newer harvest supersedes in-flight twin"
                    );
                } else {
                    object.extra.stopped_by = Some(twin);
                    info!(
                        object = %object.id,
                        superseded_by = %twin,
                        "yielding to newer in-flight twin"
                    );
                    return Ok(Advance::StopProcessing);
                }
            }
        }
        Ok(Advance::Continue)
    })
}

/// Merge an update document into its head. No-op for fresh records.
///
/// The raw incoming document moves to `extra.pending_root` so it can
/// become the new source root once the merge is accepted; the
/// object's payload becomes the merged document.
pub fn merge_update(services: &Services) -> Step {
    let records = services.records.clone();
    let roots = services.roots.clone();
    action("merge_update", move |object: &mut WorkflowObject| {
        if !object.extra.is_update {
            return Ok(Advance::Continue);
        }
        let head_id = object
            .extra
            .head_id
            .ok_or_else(|| StepError::new("update object has no head id"))?;
        let source = require_source(object)?;

        let head = records.get(head_id).map_err(StepError::wrap)?;
        // The head may itself have been merged away since
        // classification; follow the redirect once and stick to the
        // survivor.
        object.extra.head_id = Some(head.control_number);

        let root = roots
            .get_root(head.control_number, &source)
            .map_err(StepError::wrap)?
            .unwrap_or_default();
        let result = merge(&root, &head.data, &object.data);
        debug!(
            object = %object.id,
            head = %head.control_number,
            conflicts = result.conflicts.len(),
            "merged update into head"
        );
        object.extra.pending_root = Some(std::mem::replace(&mut object.data, result.merged));
        object.extra.conflicts = result.conflicts;
        Ok(Advance::Continue)
    })
}

/// Halt for a curator decision when the document is relevant,
/// otherwise record an automatic rejection and move on.
pub fn approval_gate(relevance: Relevance) -> Step {
    branch(
        "is_relevant",
        move |object: &WorkflowObject| Ok(relevance(object)),
        vec![halt("hep_approval", "record awaiting curator decision")],
        vec![action("auto_reject", |object: &mut WorkflowObject| {
            object.extra.approved = Some(false);
            object.extra.approval_reason = Some("automatically rejected as not relevant".into());
            Ok(Advance::Continue)
        })],
    )
}

/// Persist the approved document and snapshot its source root. A
/// rejected document finishes here without touching the store.
pub fn store_record(services: &Services) -> Step {
    let records = services.records.clone();
    let roots = services.roots.clone();
    let maintenance = services.maintenance.clone();
    action("store_record", move |object: &mut WorkflowObject| {
        if object.extra.approved != Some(true) {
            info!(object = %object.id, "record rejected, nothing stored");
            return Ok(Advance::StopProcessing);
        }
        let source = require_source(object)?;
        if object.extra.is_update {
            let head_id = object
                .extra
                .head_id
                .ok_or_else(|| StepError::new("update object has no head id"))?;
            records
                .put(head_id, object.data.clone())
                .map_err(StepError::wrap)?;
            let root = object
                .extra
                .pending_root
                .take()
                .unwrap_or_else(|| object.data.clone());
            roots
                .put_root(head_id, &source, root)
                .map_err(StepError::wrap)?;
            maintenance
                .record_stored(head_id, &object.data)
                .map_err(StepError::wrap)?;
            info!(object = %object.id, record = %head_id, "head replaced with merged record");
        } else {
            let record = records.insert(object.data.clone()).map_err(StepError::wrap)?;
            roots
                .put_root(record, &source, object.data.clone())
                .map_err(StepError::wrap)?;
            maintenance
                .record_stored(record, &object.data)
                .map_err(StepError::wrap)?;
            object.extra.head_id = Some(record);
            info!(object = %object.id, record = %record, "new record stored");
        }
        Ok(Advance::Continue)
    })
}

/// Run the three-way merge of two persisted records, using the stored
/// root for the update's source as the ancestor.
pub fn merge_records(services: &Services) -> Step {
    let records = services.records.clone();
    let roots = services.roots.clone();
    action("merge_records", move |object: &mut WorkflowObject| {
        let head_id = object
            .extra
            .head_id
            .ok_or_else(|| StepError::new("manual merge without a head record"))?;
        let update_id = object
            .extra
            .update_id
            .ok_or_else(|| StepError::new("manual merge without an update record"))?;
        if head_id == update_id {
            return Err(StepError::new("cannot merge a record into itself"));
        }
        let update_source = require_source(object)?;

        let head = records.get(head_id).map_err(StepError::wrap)?;
        let update = records.get(update_id).map_err(StepError::wrap)?;
        let root = roots
            .get_root(head_id, &update_source)
            .map_err(StepError::wrap)?
            .unwrap_or_default();

        let result = merge(&root, &head.data, &update.data);
        info!(
            object = %object.id,
            head = %head_id,
            update = %update_id,
            conflicts = result.conflicts.len(),
            "manual merge prepared"
        );
        object.data = result.merged;
        object.extra.conflicts = result.conflicts;
        object.extra.head_source = Some(
            head_source(roots.as_ref(), head_id)
                .map_err(StepError::wrap)?
                .unwrap_or_else(Source::publisher),
        );
        Ok(Advance::Continue)
    })
}

/// Commit an approved manual merge. Conflicts must have been cleared
/// by the curator during review.
pub fn finalize_merge(services: &Services) -> Step {
    let records = services.records.clone();
    let roots = services.roots.clone();
    let maintenance = services.maintenance.clone();
    action("finalize_merge", move |object: &mut WorkflowObject| {
        if object.extra.approved != Some(true) {
            info!(object = %object.id, "manual merge rejected, records untouched");
            return Ok(Advance::StopProcessing);
        }
        let head_id = object
            .extra
            .head_id
            .ok_or_else(|| StepError::new("manual merge without a head record"))?;
        let update_id = object
            .extra
            .update_id
            .ok_or_else(|| StepError::new("manual merge without an update record"))?;
        let head_src = object
            .extra
            .head_source
            .clone()
            .ok_or_else(|| StepError::new("manual merge without a head source"))?;
        let update_source = require_source(object)?;

        pen_finalize::finalize(
            records.as_ref(),
            roots.as_ref(),
            head_id,
            update_id,
            object.data.clone(),
            &head_src,
            &update_source,
            &object.extra.conflicts,
        )
        .map_err(StepError::wrap)?;
        maintenance
            .record_stored(head_id, &object.data)
            .map_err(StepError::wrap)?;
        maintenance
            .record_redirected(update_id, head_id)
            .map_err(StepError::wrap)?;
        Ok(Advance::Continue)
    })
}

/// Store the curated document delivered by the edit callback.
pub fn store_curated(services: &Services) -> Step {
    let records = services.records.clone();
    let maintenance = services.maintenance.clone();
    action("store_curated", move |object: &mut WorkflowObject| {
        if object.data.is_empty() {
            return Err(StepError::new("curated document is empty"));
        }
        let record = object
            .extra
            .head_id
            .ok_or_else(|| StepError::new("edit object has no target record"))?;
        records
            .put(record, object.data.clone())
            .map_err(StepError::wrap)?;
        maintenance
            .record_stored(record, &object.data)
            .map_err(StepError::wrap)?;
        info!(object = %object.id, record = %record, "curated document stored");
        Ok(Advance::Continue)
    })
}
