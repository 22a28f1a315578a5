//! Identifier-based matching: the reference equivalence.
//!
//! Two documents are equivalent when they share an external identifier
//! (arXiv eprint or DOI). This is the dominant duplicate signal for
//! harvested literature; fuzzier predicates can be plugged in through
//! the [`DuplicateIndex`](crate::DuplicateIndex) boundary instead.

use std::collections::HashMap;
use std::sync::RwLock;

use pen_types::{ControlNumber, Document};
use serde_json::Value;
use tracing::debug;

use crate::error::{MatchError, MatchResult};
use crate::traits::PersistedMatcher;

/// Document fields that carry external identifiers.
const IDENTIFIER_FIELDS: [&str; 2] = ["arxiv_eprint", "doi"];

/// Extract the external identifiers of a document, prefixed by field
/// name so an arXiv id never collides with a DOI.
pub fn external_identifiers(document: &Document) -> Vec<String> {
    let mut identifiers = Vec::new();
    for field in IDENTIFIER_FIELDS {
        match document.get(field) {
            Some(Value::String(s)) if !s.is_empty() => {
                identifiers.push(format!("{field}:{}", s.to_lowercase()));
            }
            Some(Value::Array(items)) => {
                for item in items {
                    if let Value::String(s) = item {
                        if !s.is_empty() {
                            identifiers.push(format!("{field}:{}", s.to_lowercase()));
                        }
                    }
                }
            }
            _ => {}
        }
    }
    identifiers
}

/// Returns `true` when the two documents share an external identifier.
pub fn identifier_equivalence(a: &Document, b: &Document) -> bool {
    let ids_a = external_identifiers(a);
    if ids_a.is_empty() {
        return false;
    }
    let ids_b = external_identifiers(b);
    ids_a.iter().any(|id| ids_b.contains(id))
}

/// An in-memory identifier-to-record index implementing
/// [`PersistedMatcher`].
///
/// The record store owner registers each stored record's identifiers;
/// lookups then classify incoming documents without scanning the store.
pub struct IdentifierIndex {
    by_identifier: RwLock<HashMap<String, ControlNumber>>,
}

impl IdentifierIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            by_identifier: RwLock::new(HashMap::new()),
        }
    }

    /// Register the identifiers of a stored record.
    pub fn register(&self, record: ControlNumber, document: &Document) -> MatchResult<()> {
        let identifiers = external_identifiers(document);
        let mut map = self
            .by_identifier
            .write()
            .map_err(|e| MatchError::Lock(e.to_string()))?;
        for identifier in identifiers {
            debug!(record = %record, identifier = %identifier, "identifier registered");
            map.insert(identifier, record);
        }
        Ok(())
    }

    /// Point every identifier of `from` at `to`. Used when a record is
    /// retired in favor of another, so old identifiers keep resolving.
    pub fn redirect(&self, from: ControlNumber, to: ControlNumber) -> MatchResult<()> {
        let mut map = self
            .by_identifier
            .write()
            .map_err(|e| MatchError::Lock(e.to_string()))?;
        for target in map.values_mut() {
            if *target == from {
                *target = to;
            }
        }
        Ok(())
    }
}

impl Default for IdentifierIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl crate::traits::MatcherMaintenance for IdentifierIndex {
    fn record_stored(&self, record: ControlNumber, document: &Document) -> MatchResult<()> {
        self.register(record, document)
    }

    fn record_redirected(&self, from: ControlNumber, to: ControlNumber) -> MatchResult<()> {
        self.redirect(from, to)
    }
}

impl PersistedMatcher for IdentifierIndex {
    fn match_persisted(&self, document: &Document) -> MatchResult<Option<ControlNumber>> {
        let map = self
            .by_identifier
            .read()
            .map_err(|e| MatchError::Lock(e.to_string()))?;
        for identifier in external_identifiers(document) {
            if let Some(record) = map.get(&identifier) {
                return Ok(Some(*record));
            }
        }
        Ok(None)
    }
}
