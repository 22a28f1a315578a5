//! The matcher boundaries.

use pen_types::{ControlNumber, Document};

use crate::error::MatchResult;
use crate::outcome::InFlightEntry;

/// Index over holding-pen objects.
///
/// Implementations decide the matching predicate (shared external
/// identifier, fuzzy title match, ...). Returned entries cover every
/// non-terminal object plus terminally-rejected ones, which still
/// matter for classification: re-ingesting a rejected document must
/// not put it back in front of a curator.
///
/// A stale read is tolerated: an entry may describe an object that
/// another pipeline is concurrently stopping. The stop transition is
/// defined to be safe against already-terminal objects.
pub trait DuplicateIndex: Send + Sync {
    /// All candidates matching `document`.
    fn find_matches(&self, document: &Document) -> MatchResult<Vec<InFlightEntry>>;
}

/// Lookup of an equivalent finalized record in the persistent store.
pub trait PersistedMatcher: Send + Sync {
    /// The control number of a live record equivalent to `document`,
    /// or `None`.
    fn match_persisted(&self, document: &Document) -> MatchResult<Option<ControlNumber>>;
}

/// Write side of a persisted matcher.
///
/// Whoever mutates the record store calls these so subsequent
/// classifications see the change.
pub trait MatcherMaintenance: Send + Sync {
    /// A record was stored or replaced with `document`.
    fn record_stored(&self, record: ControlNumber, document: &Document) -> MatchResult<()>;

    /// `from` was retired in favor of `to`.
    fn record_redirected(&self, from: ControlNumber, to: ControlNumber) -> MatchResult<()>;
}
