//! The three-way merge algorithm.
//!
//! Per path, `root -> head` and `root -> update` are diffed
//! independently. Where only one side changed, that side's value wins;
//! where both changed to the same value, it is taken without conflict;
//! where both changed to different values, a [`Conflict`] is recorded
//! and `head`'s value is retained as the provisional merged value.
//!
//! Nested objects are merged field by field. List-valued fields are
//! reconciled as keyed sets (see [`MergeConfig`]): items added only by
//! the update merge in cleanly, items changed on both sides at the
//! same key become list-item conflicts.

use std::collections::{BTreeSet, HashMap};

use pen_types::Document;
use serde_json::Value;

use crate::config::MergeConfig;
use crate::conflict::{Conflict, ConflictKind, MergeResult};

/// Merge with the default configuration.
pub fn merge(root: &Document, head: &Document, update: &Document) -> MergeResult {
    merge_with_config(root, head, update, &MergeConfig::default())
}

/// Merge with an explicit configuration.
///
/// Deterministic and side-effect-free: identical inputs always produce
/// an identical [`MergeResult`], conflicts in identical order.
pub fn merge_with_config(
    root: &Document,
    head: &Document,
    update: &Document,
    config: &MergeConfig,
) -> MergeResult {
    let mut conflicts = Vec::new();
    let mut merged = Document::new();

    let keys: BTreeSet<&String> = root
        .keys()
        .chain(head.keys())
        .chain(update.keys())
        .collect();

    for key in keys {
        if let Some(value) = merge_value(
            key,
            root.get(key),
            head.get(key),
            update.get(key),
            config,
            &mut conflicts,
        ) {
            merged.insert(key.clone(), value);
        }
    }

    MergeResult { merged, conflicts }
}

/// Merge a single path. Returns the merged value, `None` meaning the
/// path is absent from the merged document.
fn merge_value(
    path: &str,
    root: Option<&Value>,
    head: Option<&Value>,
    update: Option<&Value>,
    config: &MergeConfig,
    conflicts: &mut Vec<Conflict>,
) -> Option<Value> {
    let head_changed = head != root;
    let update_changed = update != root;

    if !update_changed {
        return head.cloned();
    }
    if !head_changed {
        return update.cloned();
    }

    // Both sides changed.
    if head == update {
        return head.cloned();
    }

    match (head, update) {
        (Some(Value::Object(head_map)), Some(Value::Object(update_map))) => {
            let root_map = match root {
                Some(Value::Object(map)) => Some(map),
                _ => None,
            };
            Some(merge_objects(
                path, root_map, head_map, update_map, config, conflicts,
            ))
        }
        (Some(Value::Array(head_items)), Some(Value::Array(update_items))) => {
            let root_items = match root {
                Some(Value::Array(items)) => Some(items.as_slice()),
                _ => None,
            };
            Some(merge_lists(
                path,
                root_items,
                head_items,
                update_items,
                config,
                conflicts,
            ))
        }
        _ => {
            let kind = if head.is_none() || update.is_none() {
                ConflictKind::Removal
            } else {
                ConflictKind::FieldValue
            };
            conflicts.push(Conflict::new(path, kind, head.cloned(), update.cloned()));
            head.cloned()
        }
    }
}

/// Merge two JSON objects field by field, recursing per key.
fn merge_objects(
    path: &str,
    root: Option<&serde_json::Map<String, Value>>,
    head: &serde_json::Map<String, Value>,
    update: &serde_json::Map<String, Value>,
    config: &MergeConfig,
    conflicts: &mut Vec<Conflict>,
) -> Value {
    let keys: BTreeSet<&String> = root
        .map(|m| m.keys().collect::<BTreeSet<_>>())
        .unwrap_or_default()
        .into_iter()
        .chain(head.keys())
        .chain(update.keys())
        .collect();

    let mut merged = serde_json::Map::new();
    for key in keys {
        let child_path = format!("{path}/{key}");
        if let Some(value) = merge_value(
            &child_path,
            root.and_then(|m| m.get(key)),
            head.get(key),
            update.get(key),
            config,
            conflicts,
        ) {
            merged.insert(key.clone(), value);
        }
    }
    Value::Object(merged)
}

/// Keyed-set reconciliation of list values.
///
/// Output order: head's items in head order, then update-only
/// additions in update order. Items present only in root (removed by
/// both sides) are dropped without conflict.
fn merge_lists(
    path: &str,
    root: Option<&[Value]>,
    head: &[Value],
    update: &[Value],
    config: &MergeConfig,
    conflicts: &mut Vec<Conflict>,
) -> Value {
    let root_by_key = key_items(root.unwrap_or(&[]), config);
    let update_by_key = key_items(update, config);
    let head_keys: BTreeSet<String> =
        head.iter().map(|item| item_key(item, config)).collect();

    let mut merged = Vec::new();

    for item in head {
        let key = item_key(item, config);
        let item_path = format!("{path}/{key}");
        let root_item = root_by_key.get(&key).copied();
        let update_item = update_by_key.get(&key).copied();

        let head_changed = Some(item) != root_item;
        let update_changed = update_item != root_item;

        if !update_changed {
            merged.push(item.clone());
            continue;
        }
        if !head_changed {
            // Update modified or removed this item; take its side.
            if let Some(update_item) = update_item {
                merged.push(update_item.clone());
            }
            continue;
        }

        // Both sides changed the keyed item.
        match update_item {
            Some(update_item) if update_item == item => merged.push(item.clone()),
            Some(update_item) => {
                conflicts.push(Conflict::new(
                    &item_path,
                    ConflictKind::ListItem,
                    Some(item.clone()),
                    Some(update_item.clone()),
                ));
                merged.push(item.clone());
            }
            None => {
                conflicts.push(Conflict::new(
                    &item_path,
                    ConflictKind::Removal,
                    Some(item.clone()),
                    None,
                ));
                merged.push(item.clone());
            }
        }
    }

    // Items the update has and head does not.
    for item in update {
        let key = item_key(item, config);
        if head_keys.contains(&key) {
            continue;
        }
        match root_by_key.get(&key) {
            // Absent from root and head: a pure addition.
            None => merged.push(item.clone()),
            // Head removed it. If the update left it untouched the
            // removal stands; if the update modified it, that is a
            // removal conflict and head's side (absence) is retained.
            Some(root_item) => {
                if item != *root_item {
                    conflicts.push(Conflict::new(
                        format!("{path}/{key}"),
                        ConflictKind::Removal,
                        None,
                        Some(item.clone()),
                    ));
                }
            }
        }
    }

    Value::Array(merged)
}

/// Index list items by reconciliation key. Later duplicates win, which
/// keeps the lookup deterministic for degenerate inputs.
fn key_items<'a>(
    items: &'a [Value],
    config: &MergeConfig,
) -> HashMap<String, &'a Value> {
    items
        .iter()
        .map(|item| (item_key(item, config), item))
        .collect()
}

/// The reconciliation key of a list item.
///
/// Object items use the first configured key field present; everything
/// else keys on its canonical JSON serialization, so scalar lists
/// behave as sets.
fn item_key(item: &Value, config: &MergeConfig) -> String {
    if let Value::Object(map) = item {
        for field in &config.key_fields {
            match map.get(field) {
                Some(Value::String(s)) => return s.clone(),
                Some(other) if !other.is_null() => return other.to_string(),
                _ => {}
            }
        }
    }
    item.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pen_types::document::from_value;
    use proptest::prelude::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        from_value(value).unwrap()
    }

    // -----------------------------------------------------------------
    // Field-level rules
    // -----------------------------------------------------------------

    #[test]
    fn update_only_change_is_taken_cleanly() {
        let result = merge(
            &doc(json!({})),
            &doc(json!({"title": "A"})),
            &doc(json!({"title": "A", "year": 2020})),
        );
        assert_eq!(result.merged, doc(json!({"title": "A", "year": 2020})));
        assert!(result.is_clean());
    }

    #[test]
    fn both_changed_differently_keeps_head_and_conflicts() {
        let result = merge(
            &doc(json!({"title": "A"})),
            &doc(json!({"title": "B"})),
            &doc(json!({"title": "C"})),
        );
        assert_eq!(result.merged, doc(json!({"title": "B"})));
        assert_eq!(result.conflicts.len(), 1);
        let conflict = &result.conflicts[0];
        assert_eq!(conflict.path, "title");
        assert_eq!(conflict.kind, ConflictKind::FieldValue);
        assert_eq!(conflict.head, Some(json!("B")));
        assert_eq!(conflict.update, Some(json!("C")));
    }

    #[test]
    fn both_changed_to_same_value_is_clean() {
        let result = merge(
            &doc(json!({"title": "A"})),
            &doc(json!({"title": "B"})),
            &doc(json!({"title": "B"})),
        );
        assert_eq!(result.merged, doc(json!({"title": "B"})));
        assert!(result.is_clean());
    }

    #[test]
    fn head_only_change_is_kept() {
        let result = merge(
            &doc(json!({"title": "A"})),
            &doc(json!({"title": "B", "extra": 1})),
            &doc(json!({"title": "A"})),
        );
        assert_eq!(result.merged, doc(json!({"title": "B", "extra": 1})));
        assert!(result.is_clean());
    }

    #[test]
    fn update_removal_of_untouched_field_is_applied() {
        let result = merge(
            &doc(json!({"title": "A", "note": "x"})),
            &doc(json!({"title": "A", "note": "x"})),
            &doc(json!({"title": "A"})),
        );
        assert_eq!(result.merged, doc(json!({"title": "A"})));
        assert!(result.is_clean());
    }

    #[test]
    fn update_removal_of_modified_field_conflicts() {
        let result = merge(
            &doc(json!({"note": "x"})),
            &doc(json!({"note": "y"})),
            &doc(json!({})),
        );
        assert_eq!(result.merged, doc(json!({"note": "y"})));
        assert_eq!(result.conflicts.len(), 1);
        assert_eq!(result.conflicts[0].kind, ConflictKind::Removal);
        assert_eq!(result.conflicts[0].update, None);
    }

    #[test]
    fn empty_root_attributes_all_update_differences_to_update() {
        // First update from a source: merges against nothing, so a
        // disagreement with head is a conflict and head wins.
        let result = merge(
            &doc(json!({})),
            &doc(json!({"title": "Head title"})),
            &doc(json!({"title": "Update title", "year": 1999})),
        );
        assert_eq!(
            result.merged,
            doc(json!({"title": "Head title", "year": 1999}))
        );
        assert_eq!(result.conflicts.len(), 1);
        assert_eq!(result.conflicts[0].path, "title");
    }

    // -----------------------------------------------------------------
    // Nested objects
    // -----------------------------------------------------------------

    #[test]
    fn nested_objects_merge_per_field() {
        let result = merge(
            &doc(json!({"publication_info": {"year": 2019}})),
            &doc(json!({"publication_info": {"year": 2019, "journal": "X"}})),
            &doc(json!({"publication_info": {"year": 2020}})),
        );
        assert_eq!(
            result.merged,
            doc(json!({"publication_info": {"year": 2020, "journal": "X"}}))
        );
        assert!(result.is_clean());
    }

    #[test]
    fn nested_conflict_has_full_path() {
        let result = merge(
            &doc(json!({"publication_info": {"year": 2019}})),
            &doc(json!({"publication_info": {"year": 2020}})),
            &doc(json!({"publication_info": {"year": 2021}})),
        );
        assert_eq!(result.conflicts.len(), 1);
        assert_eq!(result.conflicts[0].path, "publication_info/year");
        assert_eq!(
            result.merged,
            doc(json!({"publication_info": {"year": 2020}}))
        );
    }

    // -----------------------------------------------------------------
    // Keyed list reconciliation
    // -----------------------------------------------------------------

    #[test]
    fn list_addition_from_update_is_accepted() {
        let result = merge(
            &doc(json!({"references": [{"id": "r1", "label": "1"}]})),
            &doc(json!({"references": [{"id": "r1", "label": "1"}]})),
            &doc(json!({"references": [
                {"id": "r1", "label": "1"},
                {"id": "r2", "label": "2"},
            ]})),
        );
        assert!(result.is_clean());
        let refs = result.merged.get("references").unwrap();
        assert_eq!(refs.as_array().unwrap().len(), 2);
    }

    #[test]
    fn list_item_modified_on_both_sides_conflicts() {
        let result = merge(
            &doc(json!({"references": [{"id": "r1", "label": "1"}]})),
            &doc(json!({"references": [{"id": "r1", "label": "1a"}]})),
            &doc(json!({"references": [{"id": "r1", "label": "1b"}]})),
        );
        assert_eq!(result.conflicts.len(), 1);
        let conflict = &result.conflicts[0];
        assert_eq!(conflict.path, "references/r1");
        assert_eq!(conflict.kind, ConflictKind::ListItem);
        // Head's item is retained.
        assert_eq!(
            result.merged.get("references").unwrap(),
            &json!([{"id": "r1", "label": "1a"}])
        );
    }

    #[test]
    fn list_addition_clash_conflicts() {
        // Both sides add an item at the same key with different content.
        let result = merge(
            &doc(json!({"references": []})),
            &doc(json!({"references": [{"id": "r9", "label": "head"}]})),
            &doc(json!({"references": [{"id": "r9", "label": "update"}]})),
        );
        assert_eq!(result.conflicts.len(), 1);
        assert_eq!(result.conflicts[0].kind, ConflictKind::ListItem);
    }

    #[test]
    fn list_removal_against_modification_conflicts() {
        let result = merge(
            &doc(json!({"references": [{"id": "r1", "label": "1"}]})),
            &doc(json!({"references": []})),
            &doc(json!({"references": [{"id": "r1", "label": "1x"}]})),
        );
        assert_eq!(result.conflicts.len(), 1);
        assert_eq!(result.conflicts[0].kind, ConflictKind::Removal);
        assert_eq!(result.conflicts[0].head, None);
        // Head's removal stands in the merged document.
        assert_eq!(result.merged.get("references").unwrap(), &json!([]));
    }

    #[test]
    fn scalar_lists_behave_as_sets() {
        let result = merge(
            &doc(json!({"keywords": ["qcd"]})),
            &doc(json!({"keywords": ["qcd", "lattice"]})),
            &doc(json!({"keywords": ["qcd", "higgs"]})),
        );
        assert!(result.is_clean());
        let keywords = result.merged.get("keywords").unwrap().as_array().unwrap();
        assert_eq!(keywords, &[json!("qcd"), json!("lattice"), json!("higgs")]);
    }

    #[test]
    fn list_item_removed_by_update_only_is_removed() {
        let result = merge(
            &doc(json!({"keywords": ["qcd", "old"]})),
            &doc(json!({"keywords": ["qcd", "old"]})),
            &doc(json!({"keywords": ["qcd"]})),
        );
        assert!(result.is_clean());
        assert_eq!(result.merged.get("keywords").unwrap(), &json!(["qcd"]));
    }

    // -----------------------------------------------------------------
    // Determinism
    // -----------------------------------------------------------------

    #[test]
    fn conflicts_are_reported_in_path_order() {
        let result = merge(
            &doc(json!({"a": 1, "b": 1, "c": 1})),
            &doc(json!({"a": 2, "b": 2, "c": 2})),
            &doc(json!({"a": 3, "b": 3, "c": 3})),
        );
        let paths: Vec<&str> = result.conflicts.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, ["a", "b", "c"]);
    }

    fn leaf_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<i64>().prop_map(|n| json!(n)),
            "[a-z]{0,6}".prop_map(|s| json!(s)),
            any::<bool>().prop_map(|b| json!(b)),
        ]
    }

    fn arb_document() -> impl Strategy<Value = Document> {
        proptest::collection::btree_map("[a-e]", leaf_value(), 0..5)
    }

    proptest! {
        #[test]
        fn merge_is_deterministic(
            root in arb_document(),
            head in arb_document(),
            update in arb_document(),
        ) {
            let first = merge(&root, &head, &update);
            let second = merge(&root, &head, &update);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn identical_sides_merge_cleanly(
            root in arb_document(),
            head in arb_document(),
        ) {
            let result = merge(&root, &head, &head);
            prop_assert!(result.is_clean());
            prop_assert_eq!(result.merged, head);
        }

        #[test]
        fn update_wins_when_head_is_unchanged(
            root in arb_document(),
            update in arb_document(),
        ) {
            let result = merge(&root, &root, &update);
            prop_assert!(result.is_clean());
            prop_assert_eq!(result.merged, update);
        }
    }
}
