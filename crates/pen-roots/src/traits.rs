//! The root store boundary.

use pen_types::{ControlNumber, Document, Source};

use crate::error::RootResult;

/// Store of merge ancestors, keyed by `(record, source)`.
///
/// Invariant: at most one root per pair. `put_root` overwrites an
/// existing root; nothing ever deletes one.
pub trait RootStore: Send + Sync {
    /// The last-merged raw document from `source` for `record`, or
    /// `None` if this source never contributed to the record.
    fn get_root(&self, record: ControlNumber, source: &Source) -> RootResult<Option<Document>>;

    /// Create or overwrite the root for `(record, source)`.
    fn put_root(
        &self,
        record: ControlNumber,
        source: &Source,
        document: Document,
    ) -> RootResult<()>;

    /// All sources that have a root for `record`, in sorted order.
    fn sources_for(&self, record: ControlNumber) -> RootResult<Vec<Source>>;
}
