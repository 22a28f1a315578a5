//! Classification of an incoming document against both populations.

use pen_types::{Document, Source};
use tracing::debug;

use crate::error::MatchResult;
use crate::outcome::{CandidateOutcome, InFlightEntry, MatchOutcome};
use crate::traits::PersistedMatcher;

/// Classify `document` (with provenance `source`).
///
/// Precedence, first match wins:
/// 1. an equivalent persisted record  => `MatchedPersisted`
/// 2. an equivalent in-flight entry   => `MatchedInFlight`
/// 3. neither                         => `NoMatch`
///
/// `entries` are the candidates the duplicate index returned for this
/// document, with the incoming object itself already excluded. When
/// several candidates match, the one with the lowest object id is the
/// classification target; ids are time-ordered, so in a symmetric
/// match the earlier object is always the one considered, and mutual
/// stops resolve with the lower id yielding.
pub fn classify(
    document: &Document,
    source: &Source,
    persisted: &dyn PersistedMatcher,
    entries: &[InFlightEntry],
) -> MatchResult<MatchOutcome> {
    if let Some(record) = persisted.match_persisted(document)? {
        debug!(record = %record, "matched persisted record");
        return Ok(MatchOutcome::MatchedPersisted { record });
    }

    let candidate = entries.iter().min_by_key(|e| e.object_id);
    if let Some(candidate) = candidate {
        let outcome = if candidate.previously_rejected {
            CandidateOutcome::PreviouslyRejected
        } else {
            CandidateOutcome::Pending
        };
        debug!(
            object_id = %candidate.object_id,
            same_source = candidate.source == *source,
            ?outcome,
            "matched in-flight object"
        );
        return Ok(MatchOutcome::MatchedInFlight {
            object_id: candidate.object_id,
            same_source: candidate.source == *source,
            outcome,
        });
    }

    Ok(MatchOutcome::NoMatch)
}
