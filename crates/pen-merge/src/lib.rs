//! Three-way document merge with explicit conflict tracking.
//!
//! Given a common ancestor (`root`), the currently authoritative
//! version (`head`), and a newly ingested version (`update`), the merge
//! produces a merged document plus an ordered list of field-level
//! [`Conflict`]s. An empty conflict list is the sole signal of a clean
//! merge; conflicts are never silently dropped.
//!
//! The merge is a pure function: no I/O, no interior state, and the
//! same inputs always produce the same [`MergeResult`], so retries are
//! idempotent by construction.

pub mod config;
pub mod conflict;
pub mod merge;

pub use config::MergeConfig;
pub use conflict::{Conflict, ConflictKind, MergeResult};
pub use merge::{merge, merge_with_config};
