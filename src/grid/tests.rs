//! Row store tests
//!
//! Edit isolation, field scoping, id assignment and the cancel/accept
//! semantics of leaving edit mode.

use super::*;
use serde_json::json;

fn raw(value: serde_json::Value) -> RawRecord {
    value.as_object().cloned().expect("fixture must be an object")
}

/// The sample table: two people with caller-supplied ids 1 and 2
fn people() -> RowStore {
    let mut store = RowStore::new();
    store.load(vec![
        raw(json!({"id": 1, "name": "John Doe", "age": 28, "city": "New York", "active": true})),
        raw(json!({"id": 2, "name": "Jane Smith", "age": 32, "city": "Los Angeles", "active": false})),
    ]);
    store
}

fn three_anonymous_rows() -> RowStore {
    let mut store = RowStore::new();
    store.load(vec![
        raw(json!({"name": "a"})),
        raw(json!({"name": "b"})),
        raw(json!({"name": "c"})),
    ]);
    store
}

// ─────────────────────────────────────────────────────────────────────────────
// Loading and id assignment
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_load_assigns_positional_ids_and_readonly_state() {
    let store = three_anonymous_rows();
    let ids: Vec<u64> = store.records().iter().map(|r| r.id().0).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert!(store.records().iter().all(|r| !r.is_editing()));
}

#[test]
fn test_load_prefers_caller_ids() {
    let store = people();
    assert!(store.get(RowId(1)).is_some());
    assert!(store.get(RowId(2)).is_some());
    assert!(store.get(RowId(0)).is_none());

    // id is a key, not a field
    assert!(store.get(RowId(1)).unwrap().get("id").is_none());
}

#[test]
fn test_load_resolves_id_collisions() {
    let mut store = RowStore::new();
    store.load(vec![
        raw(json!({"name": "positional zero"})),
        raw(json!({"id": 0, "name": "claims zero"})),
        raw(json!({"id": 0, "name": "duplicate"})),
    ]);

    // Explicit id wins; the anonymous row and the duplicate move past the max
    assert_eq!(store.get(RowId(0)).unwrap().get("name"), Some(&FieldValue::text("claims zero")));
    let mut ids: Vec<u64> = store.records().iter().map(|r| r.id().0).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 3, "ids must stay unique");
}

#[test]
fn test_load_ignores_incoming_edit_flag_and_non_scalars() {
    let mut store = RowStore::new();
    store.load(vec![raw(json!({
        "isEditing": true,
        "name": "x",
        "tags": ["a", "b"],
        "missing": null
    }))]);

    let record = store.get(RowId(0)).unwrap();
    assert!(!record.is_editing());
    assert_eq!(record.field_count(), 1);
}

#[test]
fn test_load_empty_and_reload_bumps_generation() {
    let mut store = people();
    let before = store.generation();

    assert_eq!(store.load(Vec::new()), 0);
    assert!(store.is_empty());
    assert_eq!(store.generation(), before + 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Edit isolation and field scoping
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_toggle_edit_isolated_to_one_row() {
    let mut store = people();
    let other_before = store.get(RowId(2)).cloned();

    assert_eq!(store.toggle_edit(RowId(1)), Some(true));

    assert!(store.get(RowId(1)).unwrap().is_editing());
    assert_eq!(store.get(RowId(2)).cloned(), other_before);
}

#[test]
fn test_set_field_changes_only_that_field() {
    let mut store = people();
    store.toggle_edit(RowId(1));
    let before = store.get(RowId(1)).cloned().unwrap();

    assert!(store.set_field(RowId(1), "name", FieldValue::text("Ada")));

    let after = store.get(RowId(1)).unwrap();
    assert_eq!(after.get("name"), Some(&FieldValue::text("Ada")));
    assert_eq!(after.is_editing(), before.is_editing());
    for field in ["age", "city", "active"] {
        assert_eq!(after.get(field), before.get(field), "{} changed", field);
    }
}

#[test]
fn test_set_field_unknown_id_is_noop() {
    let mut store = people();
    let order_before: Vec<RowId> = store.records().iter().map(Record::id).collect();

    assert!(!store.set_field(RowId(42), "name", FieldValue::text("ghost")));

    let order_after: Vec<RowId> = store.records().iter().map(Record::id).collect();
    assert_eq!(order_before, order_after);
    assert_eq!(store.len(), 2);
}

#[test]
fn test_set_field_refuses_reserved_names() {
    let mut store = people();
    store.toggle_edit(RowId(1));
    let before = store.get(RowId(1)).cloned().unwrap();

    assert!(!store.set_field(RowId(1), "id", FieldValue::text("7")));
    assert!(!store.set_field(RowId(1), "isEditing", FieldValue::Bool(false)));

    let after = store.get(RowId(1)).unwrap();
    assert_eq!(after, &before);
    assert_eq!(after.get("id"), None);

    let json = serde_json::to_value(after).unwrap();
    assert_eq!(json["id"], 1);
    assert_eq!(json["isEditing"], true);
}

#[test]
fn test_toggle_unknown_row_leaves_table_unchanged() {
    let mut store = three_anonymous_rows();
    let before: Vec<Record> = store.records().to_vec();

    assert_eq!(store.toggle_edit(RowId(99)), None);
    assert_eq!(store.records(), before.as_slice());
}

// ─────────────────────────────────────────────────────────────────────────────
// Leaving edit mode
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_toggle_off_restores_pre_edit_values() {
    let mut store = people();
    store.toggle_edit(RowId(1));
    store.set_field(RowId(1), "name", FieldValue::text("Ada"));
    assert!(store.get(RowId(1)).unwrap().has_unsaved_changes());

    assert_eq!(store.toggle_edit(RowId(1)), Some(false));

    let record = store.get(RowId(1)).unwrap();
    assert_eq!(record.get("name"), Some(&FieldValue::text("John Doe")));
    assert!(!record.has_unsaved_changes());
}

#[test]
fn test_set_edit_state_false_keeps_values() {
    let mut store = people();
    store.set_edit_state(RowId(2), true);
    store.set_field(RowId(2), "active", FieldValue::Bool(true));

    assert!(store.set_edit_state(RowId(2), false));

    let record = store.get(RowId(2)).unwrap();
    assert!(!record.is_editing());
    assert_eq!(record.get("active"), Some(&FieldValue::Bool(true)));

    // A later edit session snapshots the accepted values
    store.toggle_edit(RowId(2));
    store.set_field(RowId(2), "active", FieldValue::Bool(false));
    store.cancel_edit(RowId(2));
    assert_eq!(store.get(RowId(2)).unwrap().get("active"), Some(&FieldValue::Bool(true)));
}

#[test]
fn test_set_edit_state_true_twice_keeps_first_snapshot() {
    let mut store = people();
    store.set_edit_state(RowId(1), true);
    store.set_field(RowId(1), "city", FieldValue::text("Chicago"));
    store.set_edit_state(RowId(1), true);

    assert!(store.cancel_edit(RowId(1)));
    assert_eq!(store.get(RowId(1)).unwrap().get("city"), Some(&FieldValue::text("New York")));
}

#[test]
fn test_settle_commit_accepts_unchanged_row() {
    let mut store = people();
    store.toggle_edit(RowId(1));
    store.set_field(RowId(1), "name", FieldValue::text("Ada"));
    let sent = store.get(RowId(1)).cloned().unwrap();

    assert_eq!(store.settle_commit(RowId(1), &sent), Some(true));

    let record = store.get(RowId(1)).unwrap();
    assert!(!record.is_editing());
    assert_eq!(record.get("name"), Some(&FieldValue::text("Ada")));
}

#[test]
fn test_settle_commit_keeps_later_edits_unsaved() {
    let mut store = people();
    store.toggle_edit(RowId(1));
    store.set_field(RowId(1), "name", FieldValue::text("Ada"));
    let sent = store.get(RowId(1)).cloned().unwrap();
    store.set_field(RowId(1), "name", FieldValue::text("Grace"));

    assert_eq!(store.settle_commit(RowId(1), &sent), Some(false));

    let record = store.get(RowId(1)).unwrap();
    assert!(record.is_editing());
    assert!(record.has_unsaved_changes());
    assert_eq!(record.get("name"), Some(&FieldValue::text("Grace")));

    // Cancelling now falls back to what was persisted, not the old value
    store.cancel_edit(RowId(1));
    assert_eq!(store.get(RowId(1)).unwrap().get("name"), Some(&FieldValue::text("Ada")));
}

#[test]
fn test_settle_commit_after_cancel_without_changes() {
    let mut store = people();
    store.toggle_edit(RowId(2));
    let sent = store.get(RowId(2)).cloned().unwrap();
    store.cancel_edit(RowId(2));

    assert_eq!(store.settle_commit(RowId(2), &sent), Some(true));
    assert!(!store.get(RowId(2)).unwrap().is_editing());
}

#[test]
fn test_settle_commit_unknown_row() {
    let mut store = people();
    let sent = Record::new(RowId(9));
    assert_eq!(store.settle_commit(RowId(9), &sent), None);
}

#[test]
fn test_cancel_edit_on_readonly_row() {
    let mut store = people();
    assert!(!store.cancel_edit(RowId(1)));
    assert!(!store.cancel_edit(RowId(7)));
    assert_eq!(store.editing_count(), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Serialization (persistence payload)
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_record_serializes_flat() {
    let mut store = people();
    store.toggle_edit(RowId(1));

    let json = serde_json::to_value(store.get(RowId(1)).unwrap()).unwrap();
    assert_eq!(json["id"], 1);
    assert_eq!(json["isEditing"], true);
    assert_eq!(json["name"], "John Doe");
    assert_eq!(json["age"], 28);
    assert_eq!(json["active"], true);
    assert!(json.get("snapshot").is_none());
}
