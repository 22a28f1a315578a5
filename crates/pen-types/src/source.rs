//! Provenance sources.
//!
//! A [`Source`] names the system a document version originated from
//! (an automated harvest, a publisher feed, a human submission). Source
//! names are normalized to lowercase on construction: the source-root
//! store keys on `(record, source)` and must never hold two roots for
//! the same pair under different casings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Invalid provenance source name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("source name must not be empty")]
    Empty,
}

/// A normalized (lowercased, trimmed) provenance source name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Source(String);

impl Source {
    /// Create a source, normalizing case and surrounding whitespace.
    pub fn new(name: &str) -> Result<Self, SourceError> {
        let normalized = name.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(SourceError::Empty);
        }
        Ok(Self(normalized))
    }

    /// The arXiv harvest source.
    pub fn arxiv() -> Self {
        Self("arxiv".to_string())
    }

    /// The publisher feed source.
    pub fn publisher() -> Self {
        Self("publisher".to_string())
    }

    /// The human-submission source.
    pub fn submitter() -> Self {
        Self("submitter".to_string())
    }

    /// The normalized name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the arXiv source.
    pub fn is_arxiv(&self) -> bool {
        self.0 == "arxiv"
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
