//! In-memory root store.

use std::collections::BTreeMap;
use std::sync::RwLock;

use pen_types::{ControlNumber, Document, Source};
use tracing::debug;

use crate::error::{RootError, RootResult};
use crate::traits::RootStore;

/// An in-memory implementation of [`RootStore`].
///
/// Roots live in a `BTreeMap` keyed by `(record, source)`, so
/// `sources_for` lists sources in sorted order without extra work.
pub struct InMemoryRootStore {
    roots: RwLock<BTreeMap<(ControlNumber, Source), Document>>,
}

impl InMemoryRootStore {
    /// Create an empty root store.
    pub fn new() -> Self {
        Self {
            roots: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for InMemoryRootStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RootStore for InMemoryRootStore {
    fn get_root(&self, record: ControlNumber, source: &Source) -> RootResult<Option<Document>> {
        let roots = self
            .roots
            .read()
            .map_err(|e| RootError::Lock(e.to_string()))?;
        Ok(roots.get(&(record, source.clone())).cloned())
    }

    fn put_root(
        &self,
        record: ControlNumber,
        source: &Source,
        document: Document,
    ) -> RootResult<()> {
        let mut roots = self
            .roots
            .write()
            .map_err(|e| RootError::Lock(e.to_string()))?;
        let replaced = roots
            .insert((record, source.clone()), document)
            .is_some();
        debug!(record = %record, source = %source, replaced, "root stored");
        Ok(())
    }

    fn sources_for(&self, record: ControlNumber) -> RootResult<Vec<Source>> {
        let roots = self
            .roots
            .read()
            .map_err(|e| RootError::Lock(e.to_string()))?;
        Ok(roots
            .keys()
            .filter(|(cn, _)| *cn == record)
            .map(|(_, source)| source.clone())
            .collect())
    }
}
