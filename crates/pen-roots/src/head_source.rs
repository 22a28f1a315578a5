//! Resolution of the authoritative source for a record's head.
//!
//! When merging an update into a record, the merge needs to know which
//! source last shaped the head. Publisher material outranks automated
//! harvests: any non-arXiv root means the head is publisher-flavored.

use pen_types::{ControlNumber, Source};

use crate::error::RootResult;
use crate::traits::RootStore;

/// Resolve the head source for `record`.
///
/// - Some non-arXiv root exists  => `publisher`
/// - Only an arXiv root exists   => `arxiv`
/// - No roots at all             => `None`
pub fn head_source(
    store: &dyn RootStore,
    record: ControlNumber,
) -> RootResult<Option<Source>> {
    let sources = store.sources_for(record)?;
    if sources.iter().any(|s| !s.is_arxiv()) {
        return Ok(Some(Source::publisher()));
    }
    if sources.iter().any(|s| s.is_arxiv()) {
        return Ok(Some(Source::arxiv()));
    }
    Ok(None)
}
