use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::{FilterMode, ValidationErrors};

/// Attribute name under which clients send (and get back) the correlation
/// token of a record that has no storage id yet.
pub const LOCAL_ID_KEY: &str = "_local_id";

/// Storage-assigned identifier of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Str(String),
}

impl RecordId {
    /// Decodes an identifier from a request value.
    ///
    /// Integers and decimal strings become [`RecordId::Int`] (query strings
    /// carry every id as text); any other string stays a [`RecordId::Str`].
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Int),
            Value::String(s) => Some(
                s.parse::<i64>()
                    .map(Self::Int)
                    .unwrap_or_else(|_| Self::Str(s.clone())),
            ),
            _ => None,
        }
    }

    /// The identifier as a JSON value (a number for integer ids).
    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(n) => Value::from(*n),
            Self::Str(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self::Str(id.to_string())
    }
}

/// A generic record handed out by a [`Model`](crate::Model).
///
/// All bulk data flows through this type. `attributes` holds the persisted
/// fields, `errors` the validation outcome of the last save or destroy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// `None` until the record has been saved.
    pub id: Option<RecordId>,
    pub attributes: Map<String, Value>,
    pub errors: ValidationErrors,
    /// Client correlation token; serialized back but never persisted.
    pub local_id: Option<Value>,
}

impl Record {
    /// Creates an unsaved record.
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self {
            attributes,
            ..Self::default()
        }
    }

    /// Creates a record that already exists in storage.
    pub fn persisted(id: RecordId, attributes: Map<String, Value>) -> Self {
        Self {
            id: Some(id),
            attributes,
            ..Self::default()
        }
    }

    /// True when the last save/destroy left no validation errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }

    /// Extract a string attribute using a JSON pointer (e.g., "/title").
    pub fn get_str(&self, pointer: &str) -> Option<&str> {
        self.pointer(pointer).and_then(|v| v.as_str())
    }

    /// Extract a boolean attribute using a JSON pointer.
    pub fn get_bool(&self, pointer: &str) -> Option<bool> {
        self.pointer(pointer).and_then(|v| v.as_bool())
    }

    /// Extract a numeric attribute using a JSON pointer.
    pub fn get_number(&self, pointer: &str) -> Option<f64> {
        self.pointer(pointer).and_then(|v| v.as_f64())
    }

    fn pointer(&self, pointer: &str) -> Option<&Value> {
        let rest = pointer.strip_prefix('/')?;
        let (head, tail) = match rest.find('/') {
            Some(at) => (&rest[..at], &rest[at..]),
            None => (rest, ""),
        };
        let value = self.attributes.get(head)?;
        if tail.is_empty() {
            Some(value)
        } else {
            value.pointer(tail)
        }
    }

    /// Overwrites the given attributes. The storage id is not an attribute
    /// and is never reassigned this way.
    pub fn assign(&mut self, attributes: Map<String, Value>) {
        for (key, value) in attributes {
            if key == "id" {
                continue;
            }
            self.attributes.insert(key, value);
        }
    }

    /// Serializes the record, exposing only the fields `fields` permits.
    ///
    /// The id comes first, then the attributes in stored order. The
    /// correlation token is always included when set.
    pub fn to_json(&self, fields: &FilterMode) -> Value {
        let mut out = Map::new();
        if let Some(id) = &self.id {
            if fields.permits("id") {
                out.insert("id".to_string(), id.to_value());
            }
        }
        for (key, value) in &self.attributes {
            if fields.permits(key) {
                out.insert(key.clone(), value.clone());
            }
        }
        if let Some(local_id) = &self.local_id {
            out.insert(LOCAL_ID_KEY.to_string(), local_id.clone());
        }
        Value::Object(out)
    }
}
