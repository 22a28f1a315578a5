//! Duplicate matching for incoming documents.
//!
//! An incoming document is classified against two populations: the
//! finalized records in the persistent store and the in-flight objects
//! in the holding pen. Matching a persisted record wins and routes the
//! document down the update/merge path; an in-flight match decides
//! whether one of the two objects must yield; otherwise the document
//! is a fresh ingestion.
//!
//! The matching predicate itself is an injected capability: this crate
//! defines the [`DuplicateIndex`] and [`PersistedMatcher`] boundaries
//! and ships one reference implementation based on shared external
//! identifiers.

pub mod classify;
pub mod error;
pub mod identifier;
pub mod outcome;
pub mod traits;

pub use classify::classify;
pub use error::{MatchError, MatchResult};
pub use identifier::{external_identifiers, identifier_equivalence, IdentifierIndex};
pub use outcome::{CandidateOutcome, InFlightEntry, MatchOutcome};
pub use traits::{DuplicateIndex, MatcherMaintenance, PersistedMatcher};
