//! Pipeline engine for the holding-pen ingestion workflows.
//!
//! A pipeline is an ordered tree of steps: actions, conditional
//! branches, and two suspension primitives. A **halt** parks the
//! object until a human approval decision arrives; a **wait** parks it
//! until an external system posts a matching callback. Suspension
//! persists the full object state, so a halted or waiting object
//! consumes nothing between suspension and resumption and survives
//! process restarts; resumption may happen on a different worker.
//!
//! Execution is strictly ordered per object: branch contents run fully
//! before the outer sequence continues, and nothing runs past a
//! suspension until it is resumed. Different objects execute
//! independently with no cross-object ordering guarantees.
//!
//! # Quick Start
//!
//! ```rust
//! use pen_engine::{action, halt, Advance, Engine, InMemoryObjectStore,
//!                  Pipeline, PipelineRegistry, Verdict};
//! use pen_types::{Document, ObjectStatus, Source};
//! use std::sync::Arc;
//!
//! let mut registry = PipelineRegistry::new();
//! registry.register(Pipeline::new(
//!     "demo",
//!     vec![
//!         action("greet", |obj| {
//!             obj.data.insert("greeted".into(), true.into());
//!             Ok(Advance::Continue)
//!         }),
//!         halt("approval", "waiting for a decision"),
//!     ],
//! ));
//!
//! let engine = Engine::new(Arc::new(InMemoryObjectStore::new()), registry);
//! let id = engine
//!     .start("demo", Document::new(), Source::arxiv())
//!     .unwrap();
//! assert_eq!(engine.status(&id).unwrap(), ObjectStatus::Halted);
//!
//! engine.resume(&id, Verdict::approve()).unwrap();
//! assert_eq!(engine.status(&id).unwrap(), ObjectStatus::Completed);
//! ```

pub mod checkpoint;
pub mod engine;
pub mod error;
pub mod file_store;
pub mod object;
pub mod step;
pub mod store;

pub use checkpoint::{BranchArm, Checkpoint, Frame};
pub use engine::{stop_object, Engine};
pub use error::{EngineError, EngineResult, StepError};
pub use file_store::FileObjectStore;
pub use object::{ExtraData, FailureInfo, Verdict, WorkflowObject};
pub use step::{
    action, branch, halt, wait, when, Action, Advance, Pipeline, PipelineRegistry,
    Predicate, Step,
};
pub use store::{InMemoryObjectStore, ObjectStore};
