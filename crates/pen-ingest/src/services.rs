//! Service handles shared by every pipeline step.

use std::sync::Arc;

use pen_engine::store::ObjectStore;
use pen_match::{DuplicateIndex, MatcherMaintenance, PersistedMatcher};
use pen_roots::RootStore;
use pen_store::RecordStore;
use pen_types::{ControlNumber, Document};

/// The stores and matchers the pipelines run against.
///
/// Everything is behind `Arc<dyn ...>`, so one `Services` value can be
/// cloned into any number of step closures.
#[derive(Clone)]
pub struct Services {
    pub records: Arc<dyn RecordStore>,
    pub roots: Arc<dyn RootStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub index: Arc<dyn DuplicateIndex>,
    pub matcher: Arc<dyn PersistedMatcher>,
    pub maintenance: Arc<dyn MatcherMaintenance>,
}

/// A maintenance sink for matchers that need no upkeep.
pub struct NoMaintenance;

impl MatcherMaintenance for NoMaintenance {
    fn record_stored(
        &self,
        _record: ControlNumber,
        _document: &Document,
    ) -> pen_match::MatchResult<()> {
        Ok(())
    }

    fn record_redirected(
        &self,
        _from: ControlNumber,
        _to: ControlNumber,
    ) -> pen_match::MatchResult<()> {
        Ok(())
    }
}
