//! The pipeline definitions and their entry points.

use std::sync::Arc;

use pen_engine::{halt, wait, Engine, EngineResult, ExtraData, Pipeline, PipelineRegistry, Step};
use pen_types::{ControlNumber, Document, ObjectId, Source};

use crate::services::Services;
use crate::tasks::{
    approval_gate, classify_document, finalize_merge, merge_records, merge_update,
    resolve_in_flight_match, store_curated, store_record, Relevance,
};

pub const INGESTION: &str = "ingestion";
pub const MANUAL_MERGE: &str = "manual_merge";
pub const EDIT: &str = "edit_article";

/// Knobs of the ingestion pipeline.
pub struct IngestionOptions {
    /// Steps spliced in after matching and before the merge, for
    /// callers that enrich the document with external material.
    pub enrichment: Vec<Step>,
    /// Decides whether a document deserves curator attention; the
    /// rest is rejected automatically.
    pub relevance: Relevance,
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            enrichment: Vec::new(),
            relevance: Arc::new(|_| true),
        }
    }
}

/// The full harvest-to-record pipeline.
pub fn ingestion_pipeline(services: &Services, options: IngestionOptions) -> Pipeline {
    let mut steps = vec![
        classify_document(services),
        resolve_in_flight_match(services),
    ];
    steps.extend(options.enrichment);
    steps.push(merge_update(services));
    steps.push(approval_gate(options.relevance));
    steps.push(store_record(services));
    Pipeline::new(INGESTION, steps)
}

/// Curator-driven merge of two persisted records.
pub fn manual_merge_pipeline(services: &Services) -> Pipeline {
    Pipeline::new(
        MANUAL_MERGE,
        vec![
            merge_records(services),
            halt("merge_approval", "merged record awaiting curator review"),
            finalize_merge(services),
        ],
    )
}

/// Out-of-band curation of a single record.
pub fn edit_pipeline(services: &Services) -> Pipeline {
    Pipeline::new(
        EDIT,
        vec![
            wait("curated document from the record editor"),
            store_curated(services),
        ],
    )
}

/// All three pipelines, registered under their canonical names.
pub fn registry(services: &Services, options: IngestionOptions) -> PipelineRegistry {
    let mut registry = PipelineRegistry::new();
    registry.register(ingestion_pipeline(services, options));
    registry.register(manual_merge_pipeline(services));
    registry.register(edit_pipeline(services));
    registry
}

/// Ingest a harvested document.
pub fn start_ingestion(
    engine: &Engine,
    document: Document,
    source: Source,
) -> EngineResult<ObjectId> {
    engine.start(INGESTION, document, source)
}

/// Begin a curator-requested merge of `update` into `head`. The
/// source describes where the update record originally came from; it
/// selects the merge root and receives the post-merge root snapshot.
pub fn start_manual_merge(
    engine: &Engine,
    head: ControlNumber,
    update: ControlNumber,
    update_source: Source,
) -> EngineResult<ObjectId> {
    let mut extra = ExtraData::new(update_source);
    extra.head_id = Some(head);
    extra.update_id = Some(update);
    engine.start_with_extra(MANUAL_MERGE, Document::new(), extra)
}

/// Open `record` for out-of-band curation. The returned object waits
/// with a callback key; posting the curated document to
/// [`Engine::resume_callback`] stores it.
pub fn start_edit(
    engine: &Engine,
    record: ControlNumber,
    current: Document,
    source: Source,
) -> EngineResult<ObjectId> {
    let mut extra = ExtraData::new(source);
    extra.head_id = Some(record);
    engine.start_with_extra(EDIT, current, extra)
}
