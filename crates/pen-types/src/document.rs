//! Bibliographic documents as ordered JSON maps.
//!
//! A [`Document`] is a `BTreeMap<String, serde_json::Value>`: the map
//! iterates in key order, so every pass over a document (diffing,
//! merging, serialization) is deterministic without extra sorting.

use std::collections::BTreeMap;

use serde_json::Value;

/// A bibliographic document: top-level fields mapped to JSON values.
///
/// Nested structure (objects within fields, lists of objects) lives in
/// the `Value`s; only the top level is flattened into the map.
pub type Document = BTreeMap<String, Value>;

/// Look up a nested value by a slash-separated path.
///
/// Each segment indexes either an object field or, when it parses as an
/// integer, a list position. Returns `None` as soon as a segment does
/// not resolve.
pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('/');
    let first = segments.next()?;
    let mut current = doc.get(first)?;

    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => {
                let index: usize = segment.parse().ok()?;
                items.get(index)?
            }
            _ => return None,
        };
    }
    Some(current)
}

/// Convert a JSON value into a document.
///
/// Returns `None` if the value is not an object.
pub fn from_value(value: Value) -> Option<Document> {
    match value {
        Value::Object(map) => Some(map.into_iter().collect()),
        _ => None,
    }
}
