use bulk_model::{FilterMode, LOCAL_ID_KEY, Record, RecordId};
use pretty_assertions::assert_eq;
use serde_json::{Map, Value, json};

fn attrs(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn make_record(data: Value) -> Record {
    Record::persisted(RecordId::Int(1), attrs(data))
}

// ── RecordId ─────────────────────────────────────────────────────

#[test]
fn record_id_from_integer() {
    assert_eq!(RecordId::from_value(&json!(7)), Some(RecordId::Int(7)));
}

#[test]
fn record_id_from_decimal_string() {
    assert_eq!(RecordId::from_value(&json!("42")), Some(RecordId::Int(42)));
}

#[test]
fn record_id_from_opaque_string() {
    assert_eq!(
        RecordId::from_value(&json!("abc-1")),
        Some(RecordId::Str("abc-1".to_string()))
    );
}

#[test]
fn record_id_rejects_non_scalars() {
    assert_eq!(RecordId::from_value(&json!(null)), None);
    assert_eq!(RecordId::from_value(&json!({"id": 1})), None);
    assert_eq!(RecordId::from_value(&json!(1.5)), None);
}

#[test]
fn record_id_display_and_value() {
    assert_eq!(RecordId::Int(3).to_string(), "3");
    assert_eq!(RecordId::from("x").to_string(), "x");
    assert_eq!(RecordId::Int(3).to_value(), json!(3));
    assert_eq!(RecordId::from("x").to_value(), json!("x"));
}

// ── Construction ─────────────────────────────────────────────────

#[test]
fn new_record_is_not_persisted() {
    let r = Record::new(attrs(json!({"title": "Foo"})));
    assert!(r.id.is_none());
    assert!(r.is_valid());
    assert_eq!(r.get("title"), Some(&json!("Foo")));
}

#[test]
fn persisted_record_has_id() {
    let r = make_record(json!({}));
    assert_eq!(r.id, Some(RecordId::Int(1)));
}

// ── JSON pointer helpers ─────────────────────────────────────────

#[test]
fn pointer_helpers_read_typed_values() {
    let r = make_record(json!({"title": "Foo", "done": true, "points": 3, "meta": {"owner": "ann"}}));
    assert_eq!(r.get_str("/title"), Some("Foo"));
    assert_eq!(r.get_bool("/done"), Some(true));
    assert_eq!(r.get_number("/points"), Some(3.0));
    assert_eq!(r.get_str("/meta/owner"), Some("ann"));
}

#[test]
fn pointer_helpers_return_none_on_mismatch() {
    let r = make_record(json!({"title": "Foo"}));
    assert_eq!(r.get_bool("/title"), None);
    assert_eq!(r.get_str("/missing"), None);
    assert_eq!(r.get_str("title"), None);
}

// ── assign ───────────────────────────────────────────────────────

#[test]
fn assign_overwrites_and_adds() {
    let mut r = make_record(json!({"title": "Foo", "done": false}));
    r.assign(attrs(json!({"done": true, "notes": "n"})));
    assert_eq!(r.get("title"), Some(&json!("Foo")));
    assert_eq!(r.get("done"), Some(&json!(true)));
    assert_eq!(r.get("notes"), Some(&json!("n")));
}

#[test]
fn assign_never_touches_id() {
    let mut r = make_record(json!({"title": "Foo"}));
    r.assign(attrs(json!({"id": 99, "title": "Bar"})));
    assert_eq!(r.id, Some(RecordId::Int(1)));
    assert_eq!(r.get("id"), None);
    assert_eq!(r.get_str("/title"), Some("Bar"));
}

// ── to_json ──────────────────────────────────────────────────────

#[test]
fn to_json_puts_id_first() {
    let r = make_record(json!({"title": "Foo"}));
    let out = r.to_json(&FilterMode::None);
    assert_eq!(out, json!({"id": 1, "title": "Foo"}));
    let keys: Vec<_> = out.as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, vec!["id", "title"]);
}

#[test]
fn to_json_applies_field_filter() {
    let r = make_record(json!({"title": "task", "done": true}));
    assert_eq!(r.to_json(&FilterMode::allow(["title"])), json!({"title": "task"}));
    assert_eq!(r.to_json(&FilterMode::deny(["done"])), json!({"id": 1, "title": "task"}));
}

#[test]
fn to_json_always_includes_local_id() {
    let mut r = make_record(json!({"title": "A"}));
    r.local_id = Some(json!(10));
    let out = r.to_json(&FilterMode::allow(["title"]));
    assert_eq!(out, json!({"title": "A", "_local_id": 10}));
    assert_eq!(out[LOCAL_ID_KEY], json!(10));
}

#[test]
fn to_json_of_unsaved_record_has_no_id() {
    let r = Record::new(attrs(json!({"title": "A"})));
    assert_eq!(r.to_json(&FilterMode::None), json!({"title": "A"}));
}
