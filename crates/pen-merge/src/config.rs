//! Merge configuration: how list items are keyed for reconciliation.

/// Configuration for the merge engine.
///
/// List-valued fields are reconciled as keyed sets rather than by
/// position. An item's key is the value of the first `key_fields`
/// member present on it (for object items); items without any key
/// field, and scalar items, key on their canonical JSON serialization,
/// which makes such lists behave as sets.
#[derive(Clone, Debug)]
pub struct MergeConfig {
    /// Candidate identifier fields tried in order on object list items.
    pub key_fields: Vec<String>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            key_fields: vec![
                "$ref".to_string(),
                "id".to_string(),
                "key".to_string(),
                "source".to_string(),
            ],
        }
    }
}

impl MergeConfig {
    /// A configuration with custom key fields.
    pub fn with_key_fields(key_fields: Vec<String>) -> Self {
        Self { key_fields }
    }
}
