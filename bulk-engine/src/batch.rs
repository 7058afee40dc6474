//! Decoding of one resource's batch payload into handler input.

use bulk_model::RecordId;
use serde_json::{Map, Value};
use tracing::warn;

/// Sentinel payload that asks `get` for every record.
pub const ALL: &str = "all";

/// Which records a `get` asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdSelection {
    All,
    Ids(Vec<RecordId>),
}

/// Flattens a payload into its items.
///
/// Arrays are taken as-is, objects whose keys are all indices (`tasks[0]`,
/// `tasks[1]` in form encoding) in index order, a lone attribute object or
/// scalar as a single item, `null` and `""` as nothing.
pub fn items(payload: Value) -> Vec<Value> {
    match payload {
        Value::Null => Vec::new(),
        Value::String(s) if s.is_empty() => Vec::new(),
        Value::Array(items) => items,
        Value::Object(map) if is_indexed(&map) => {
            let mut indexed: Vec<(u64, Value)> = map
                .into_iter()
                .filter_map(|(k, v)| k.parse::<u64>().ok().map(|i| (i, v)))
                .collect();
            indexed.sort_by_key(|(i, _)| *i);
            indexed.into_iter().map(|(_, v)| v).collect()
        }
        other => vec![other],
    }
}

/// Payload of a `get`: the `"all"` sentinel or a list of ids.
pub fn selection(payload: Value) -> IdSelection {
    match &payload {
        Value::String(s) if s == ALL => IdSelection::All,
        _ => IdSelection::Ids(ids(payload)),
    }
}

/// Payload of a `get` or `delete`: a list of ids. Items may also be
/// mappings carrying an `id`. Undecodable items are dropped.
pub fn ids(payload: Value) -> Vec<RecordId> {
    items(payload)
        .into_iter()
        .filter_map(|item| {
            let id = match &item {
                Value::Object(map) => map.get("id").and_then(RecordId::from_value),
                scalar => RecordId::from_value(scalar),
            };
            if id.is_none() {
                warn!("dropping undecodable record id: {}", item);
            }
            id
        })
        .collect()
}

/// Payload of a `create` or `update`: a list of attribute mappings.
/// Non-mapping items are dropped.
pub fn attribute_sets(payload: Value) -> Vec<Map<String, Value>> {
    items(payload)
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            other => {
                warn!("dropping non-mapping batch item: {}", other);
                None
            }
        })
        .collect()
}

fn is_indexed(map: &Map<String, Value>) -> bool {
    !map.is_empty() && map.keys().all(|k| !k.is_empty() && k.bytes().all(|b| b.is_ascii_digit()))
}
