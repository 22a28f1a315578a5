//! Foundation types for the holding-pen ingestion workflows.
//!
//! This crate provides the document, identity, provenance, and status
//! types used throughout the system. Every other `pen` crate depends
//! on `pen-types`.
//!
//! # Key Types
//!
//! - [`Document`]: A bibliographic record as an ordered JSON map
//! - [`ControlNumber`]: Persistent, monotonically-assigned record identity
//! - [`ObjectId`]: UUID v7 identifier for in-flight workflow objects
//! - [`Source`]: Normalized provenance source name
//! - [`ObjectStatus`]: Lifecycle status of a workflow object

pub mod document;
pub mod id;
pub mod source;
pub mod status;

pub use document::{get_path, Document};
pub use id::{record_ref, ControlNumber, ObjectId};
pub use source::{Source, SourceError};
pub use status::ObjectStatus;
