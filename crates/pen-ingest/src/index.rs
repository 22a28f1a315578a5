//! Duplicate index over the live object store.

use std::sync::Arc;

use pen_engine::store::ObjectStore;
use pen_match::{identifier_equivalence, DuplicateIndex, InFlightEntry, MatchError, MatchResult};
use pen_types::Document;
use tracing::debug;

/// A pluggable document-equivalence predicate.
pub type Equivalence = Arc<dyn Fn(&Document, &Document) -> bool + Send + Sync>;

/// [`DuplicateIndex`] backed by a scan of the object store.
///
/// Candidates are the non-terminal objects plus the terminally
/// rejected ones; the latter stay visible so a re-ingested rejected
/// document never goes back in front of a curator. Which objects
/// count as equivalent is decided by the injected predicate.
pub struct PenIndex {
    objects: Arc<dyn ObjectStore>,
    equivalent: Equivalence,
}

impl PenIndex {
    pub fn new(objects: Arc<dyn ObjectStore>, equivalent: Equivalence) -> Self {
        Self { objects, equivalent }
    }

    /// Index using the shared-external-identifier predicate.
    pub fn with_identifier_equivalence(objects: Arc<dyn ObjectStore>) -> Self {
        Self::new(objects, Arc::new(|a, b| identifier_equivalence(a, b)))
    }
}

impl DuplicateIndex for PenIndex {
    fn find_matches(&self, document: &Document) -> MatchResult<Vec<InFlightEntry>> {
        let objects = self
            .objects
            .list_all()
            .map_err(|e| MatchError::Index(e.to_string()))?;

        let mut entries = Vec::new();
        for object in objects {
            let rejected = object.status.is_terminal() && object.extra.approved == Some(false);
            if object.status.is_terminal() && !rejected {
                continue;
            }
            let Some(source) = object.extra.source.clone() else {
                continue;
            };
            if (self.equivalent)(document, &object.data) {
                entries.push(InFlightEntry {
                    object_id: object.id,
                    status: object.status,
                    source,
                    previously_rejected: rejected,
                });
            }
        }
        debug!(candidates = entries.len(), "duplicate index scan");
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pen_engine::{ExtraData, InMemoryObjectStore, WorkflowObject};
    use pen_types::{document::from_value, ObjectStatus, Source};
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        from_value(value).unwrap()
    }

    fn saved_object(
        store: &InMemoryObjectStore,
        data: Document,
        status: ObjectStatus,
        approved: Option<bool>,
    ) -> WorkflowObject {
        let mut extra = ExtraData::new(Source::new("arxiv").unwrap());
        extra.approved = approved;
        let mut obj = WorkflowObject::new("ingestion", data, extra);
        obj.status = status;
        store.save(&obj).unwrap();
        obj
    }

    #[test]
    fn matches_in_flight_objects_with_shared_identifier() {
        let store = Arc::new(InMemoryObjectStore::new());
        let held = saved_object(
            &store,
            doc(json!({"arxiv_eprint": "2101.00001"})),
            ObjectStatus::Halted,
            None,
        );
        saved_object(
            &store,
            doc(json!({"arxiv_eprint": "9999.99999"})),
            ObjectStatus::Halted,
            None,
        );

        let index = PenIndex::with_identifier_equivalence(store);
        let entries = index
            .find_matches(&doc(json!({"arxiv_eprint": "2101.00001"})))
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].object_id, held.id);
        assert!(!entries[0].previously_rejected);
    }

    #[test]
    fn completed_accepted_objects_are_invisible() {
        let store = Arc::new(InMemoryObjectStore::new());
        saved_object(
            &store,
            doc(json!({"doi": "10.1/x"})),
            ObjectStatus::Completed,
            Some(true),
        );

        let index = PenIndex::with_identifier_equivalence(store);
        assert!(index
            .find_matches(&doc(json!({"doi": "10.1/x"})))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn rejected_objects_stay_visible() {
        let store = Arc::new(InMemoryObjectStore::new());
        let rejected = saved_object(
            &store,
            doc(json!({"doi": "10.1/x"})),
            ObjectStatus::Completed,
            Some(false),
        );

        let index = PenIndex::with_identifier_equivalence(store);
        let entries = index
            .find_matches(&doc(json!({"doi": "10.1/x"})))
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].object_id, rejected.id);
        assert!(entries[0].previously_rejected);
    }
}
