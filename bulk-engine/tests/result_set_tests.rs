mod common;

use bulk_engine::{ErrorEntry, ErrorKind, RecordKey, ResultSet, SerializeOptions};
use bulk_model::{FilterMode, Record, RecordId};
use common::attrs;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{Value, json};
use std::collections::BTreeSet;

fn task(id: i64, title: &str) -> Record {
    Record::persisted(RecordId::Int(id), attrs(json!({"title": title})))
}

fn key(k: &str) -> RecordKey {
    RecordKey::new(k)
}

// ── ErrorEntry ──────────────────────────────────────────────────

#[test]
fn error_entry_omits_missing_detail() {
    let entry = ErrorEntry::new(ErrorKind::Forbidden, None);
    assert_eq!(entry.to_value(), json!({"type": "forbidden"}));
    assert_eq!(serde_json::to_value(&entry).unwrap(), json!({"type": "forbidden"}));
}

#[test]
fn error_entry_carries_detail() {
    let entry = ErrorEntry::new(ErrorKind::Invalid, Some(json!({"title": ["can't be blank"]})));
    assert_eq!(
        entry.to_value(),
        json!({"type": "invalid", "data": {"title": ["can't be blank"]}})
    );
    assert_eq!(entry.kind(), ErrorKind::Invalid);
}

#[test]
fn record_key_from_token() {
    assert_eq!(RecordKey::from_token(None).as_str(), "null");
    assert_eq!(RecordKey::from_token(Some(&Value::Null)).as_str(), "null");
    assert_eq!(RecordKey::from_token(Some(&json!(10))).as_str(), "10");
    assert_eq!(RecordKey::from_token(Some(&json!("abc"))).as_str(), "abc");
    assert_eq!(RecordKey::from(&RecordId::Int(4)).as_str(), "4");
}

// ── ResultSet ───────────────────────────────────────────────────

#[test]
fn serialize_without_errors_has_no_errors_key() {
    let mut results = ResultSet::new();
    results.set(key("1"), task(1, "Foo"));

    let out = results.serialize("tasks", &SerializeOptions::default());
    assert_eq!(Value::Object(out), json!({"tasks": [{"id": 1, "title": "Foo"}]}));
}

#[test]
fn error_excludes_record_from_list() {
    let mut results = ResultSet::new();
    results.set(key("1"), task(1, "Foo"));
    results.set(key("2"), task(2, "Bar"));
    results.set_error(key("1"), ErrorKind::Forbidden, None);

    let out = results.serialize("tasks", &SerializeOptions::default());
    assert_eq!(
        Value::Object(out),
        json!({
            "tasks": [{"id": 2, "title": "Bar"}],
            "errors": {"tasks": {"1": {"type": "forbidden"}}}
        })
    );
    assert_eq!(results.successes().count(), 1);
    assert!(results.has_errors());
}

#[test]
fn overwrite_keeps_first_position() {
    let mut results = ResultSet::new();
    results.set(key("1"), task(1, "Foo"));
    results.set(key("2"), task(2, "Bar"));
    results.set(key("1"), task(1, "Updated"));

    let out = results.serialize("tasks", &SerializeOptions::default());
    assert_eq!(
        Value::Object(out),
        json!({"tasks": [{"id": 1, "title": "Updated"}, {"id": 2, "title": "Bar"}]})
    );
}

#[test]
fn error_overwrite_keeps_first_position() {
    let mut results = ResultSet::new();
    results.set_error(key("a"), ErrorKind::Invalid, None);
    results.set_error(key("b"), ErrorKind::Forbidden, None);
    results.set_error(key("a"), ErrorKind::Forbidden, None);

    let keys: Vec<&str> = results.errors().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["a", "b"]);
    assert_eq!(results.error(&key("a")).unwrap().kind(), ErrorKind::Forbidden);
    assert!(results.successes().next().is_none());
}

#[test]
fn set_validated_records_invalid_entry() {
    let mut record = task(1, "");
    record.errors.add("title", "can't be blank");

    let mut results = ResultSet::new();
    results.set_validated(key("1"), record);

    assert!(results.record(&key("1")).is_some());
    assert_eq!(
        results.error(&key("1")).unwrap().detail(),
        Some(&json!({"title": ["can't be blank"]}))
    );
}

#[test]
fn serialize_only_ids() {
    let mut results = ResultSet::new();
    results.set(key("1"), task(1, "Foo"));
    results.set(key("2"), task(2, "Bar"));

    let options = SerializeOptions {
        only_ids: true,
        fields: None,
    };
    assert_eq!(Value::Object(results.serialize("tasks", &options)), json!({"tasks": [1, 2]}));
}

#[test]
fn serialize_with_field_filter() {
    let mut results = ResultSet::new();
    let mut record = task(1, "Foo");
    record.attributes.insert("secret".into(), json!("x"));
    record.local_id = Some(json!(10));
    results.set(key("10"), record);

    let fields = FilterMode::deny(["secret"]);
    let options = SerializeOptions {
        only_ids: false,
        fields: Some(&fields),
    };
    assert_eq!(
        Value::Object(results.serialize("tasks", &options)),
        json!({"tasks": [{"id": 1, "title": "Foo", "_local_id": 10}]})
    );
}

#[test]
fn empty_result_set() {
    let results = ResultSet::new();
    assert!(results.is_empty());
    assert_eq!(
        Value::Object(results.serialize("tasks", &SerializeOptions::default())),
        json!({"tasks": []})
    );
}

// ── Properties ──────────────────────────────────────────────────

proptest! {
    /// Every key set is either serialized as a record or reported as an
    /// error, never both.
    #[test]
    fn serialized_keys_partition_submitted_keys(
        outcomes in proptest::collection::btree_map(1i64..500, any::<Option<bool>>(), 0..40)
    ) {
        let mut results = ResultSet::new();
        let mut expected_ok = Vec::new();
        let mut expected_err = BTreeSet::new();
        for (id, outcome) in &outcomes {
            let k = RecordKey::from(&RecordId::Int(*id));
            match outcome {
                None => {
                    results.set_error(k.clone(), ErrorKind::Forbidden, None);
                    expected_err.insert(k.to_string());
                }
                Some(valid) => {
                    let mut record = task(*id, "t");
                    if !valid {
                        record.errors.add("title", "can't be blank");
                        expected_err.insert(k.to_string());
                    } else {
                        expected_ok.push(json!(*id));
                    }
                    results.set_validated(k, record);
                }
            }
        }

        let options = SerializeOptions { only_ids: true, fields: None };
        let out = results.serialize("tasks", &options);

        prop_assert_eq!(out["tasks"].as_array().unwrap(), &expected_ok);
        let errors: BTreeSet<String> = out
            .get("errors")
            .and_then(|e| e["tasks"].as_object())
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        prop_assert_eq!(&errors, &expected_err);
        prop_assert_eq!(expected_ok.len() + expected_err.len(), outcomes.len());
    }
}
