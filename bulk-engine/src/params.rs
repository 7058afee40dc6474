//! Parameter tree decoding.
//!
//! Query strings and form bodies arrive as flat `(name, value)` pairs using
//! bracket notation (`tasks[]=1`, `tasks[][title]=A`, `tasks[0][title]=A`).
//! They are folded into the same JSON tree a JSON body would produce.

use serde_json::{Map, Value};
use tracing::debug;

/// Most bracket segments a parameter name may carry. Deeper names are
/// dropped whole.
pub const MAX_NESTING: usize = 32;

/// Folds bracket-notation pairs into a parameter tree.
pub fn decode_pairs<I, K, V>(pairs: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let mut params = Map::new();
    for (name, value) in pairs {
        let name = name.as_ref();
        let depth = name.matches('[').count();
        if depth > MAX_NESTING {
            debug!(
                "dropping parameter nested {} levels deep (limit {})",
                depth, MAX_NESTING
            );
            continue;
        }
        normalize(&mut params, name, Value::String(value.into()));
    }
    params
}

/// Parses a JSON request body into a parameter tree.
///
/// Empty bodies, malformed JSON and non-object documents all count as no
/// body.
pub fn decode_json_body(body: &[u8]) -> Option<Map<String, Value>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Some(map),
        Ok(other) => {
            debug!("ignoring non-object JSON body ({})", type_name(&other));
            None
        }
        Err(e) => {
            debug!("ignoring malformed JSON body: {}", e);
            None
        }
    }
}

/// Overlays `overlay` onto `base`; overlay wins on conflicting names.
pub fn merge_params(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        base.insert(key, value);
    }
}

/// Each recursive step consumes at least one `[`, so the bracket count
/// checked in [`decode_pairs`] bounds the recursion.
fn normalize(params: &mut Map<String, Value>, name: &str, value: Value) {
    let trimmed = name.trim_start_matches(['[', ']']);
    let key_end = trimmed.find(['[', ']']).unwrap_or(trimmed.len());
    let key = &trimmed[..key_end];
    if key.is_empty() {
        return;
    }
    let after = trimmed[key_end..].trim_start_matches(']');

    if after.is_empty() {
        params.insert(key.to_string(), value);
    } else if after == "[" {
        params.insert(name.to_string(), value);
    } else if after == "[]" {
        array_at(params, key).push(value);
    } else if let Some(child) = after.strip_prefix("[]") {
        let child_key = child
            .strip_prefix('[')
            .and_then(|c| c.strip_suffix(']'))
            .filter(|c| !c.contains(['[', ']']))
            .unwrap_or(child);
        let head = leading_key(child_key);
        let items = array_at(params, key);
        // Continue the last mapping until one of its keys repeats.
        let extend_last = matches!(items.last(), Some(Value::Object(last)) if !last.contains_key(head));
        if extend_last {
            if let Some(Value::Object(last)) = items.last_mut() {
                normalize(last, child_key, value);
            }
        } else {
            let mut fresh = Map::new();
            normalize(&mut fresh, child_key, value);
            items.push(Value::Object(fresh));
        }
    } else {
        normalize(object_at(params, key), after, value);
    }
}

fn leading_key(name: &str) -> &str {
    let trimmed = name.trim_start_matches(['[', ']']);
    let end = trimmed.find(['[', ']']).unwrap_or(trimmed.len());
    &trimmed[..end]
}

fn array_at<'a>(params: &'a mut Map<String, Value>, key: &str) -> &'a mut Vec<Value> {
    let slot = params.entry(key.to_string()).or_insert_with(|| Value::Array(Vec::new()));
    if !slot.is_array() {
        debug!("parameter `{}` redeclared as a list", key);
        *slot = Value::Array(Vec::new());
    }
    match slot {
        Value::Array(items) => items,
        _ => unreachable!("slot was just set to an array"),
    }
}

fn object_at<'a>(params: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let slot = params.entry(key.to_string()).or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        debug!("parameter `{}` redeclared as a mapping", key);
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(map) => map,
        _ => unreachable!("slot was just set to an object"),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
