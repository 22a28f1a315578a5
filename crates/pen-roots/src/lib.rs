//! Source-root store: per-(record, source) merge ancestors.
//!
//! For every logical record and every provenance source that has
//! contributed to it, the store keeps the raw document as last merged
//! from that source. That snapshot, the *root*, is the common
//! ancestor for the next three-way merge of an update from the same
//! source. A first update from a source merges against an empty root.
//!
//! There is at most one root per `(record, source)` pair: subsequent
//! merges overwrite, never duplicate, and roots are never deleted.

pub mod error;
pub mod head_source;
pub mod memory;
pub mod traits;

pub use error::{RootError, RootResult};
pub use head_source::head_source;
pub use memory::InMemoryRootStore;
pub use traits::RootStore;
