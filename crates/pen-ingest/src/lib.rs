//! The holding-pen pipelines.
//!
//! This crate wires the matcher, merger, stores, and engine into the
//! three workflows the ingestion system runs:
//!
//! - **ingestion**: classify a harvested document, supersede or yield
//!   to in-flight twins, merge updates against the stored head, and
//!   put accepted content into the record store;
//! - **manual merge**: curator-requested merge of two persisted
//!   records, committed atomically on approval;
//! - **edit**: out-of-band curation of a single record through a
//!   callback.
//!
//! Pipelines are plain [`Pipeline`](pen_engine::Pipeline) values, so
//! callers can splice in their own enrichment steps or swap the
//! matching predicate without touching this crate.

pub mod index;
pub mod pipelines;
pub mod services;
pub mod tasks;

pub use index::{Equivalence, PenIndex};
pub use pipelines::{
    edit_pipeline, ingestion_pipeline, manual_merge_pipeline, registry, start_edit,
    start_ingestion, start_manual_merge, IngestionOptions, EDIT, INGESTION, MANUAL_MERGE,
};
pub use services::{NoMaintenance, Services};
