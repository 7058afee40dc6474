//! Ordered success/error aggregation for one operation on one resource.
//!
//! A [`ResultSet`] keeps two insertion-ordered maps over the same key space:
//! key → record and key → [`ErrorEntry`]. An error always wins at
//! serialization time, so a record that was saved but came back invalid is
//! reported only under `errors`.

use bulk_model::{FilterMode, Record, RecordId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Top-level response key holding per-record failures.
pub const ERRORS_KEY: &str = "errors";

/// Key of a record inside one operation: its storage id, or the client's
/// correlation token for records being created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordKey(String);

impl RecordKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key for a correlation token. Strings are used verbatim, numbers in
    /// their JSON form; a missing token becomes `"null"`.
    pub fn from_token(token: Option<&Value>) -> Self {
        match token {
            None | Some(Value::Null) => Self::new("null"),
            Some(Value::String(s)) => Self::new(s.clone()),
            Some(other) => Self::new(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&RecordId> for RecordKey {
    fn from(id: &RecordId) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a record failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// An authorization hook refused the record or its batch.
    Forbidden,
    /// Storage reported validation errors on save or destroy.
    Invalid,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forbidden => "forbidden",
            Self::Invalid => "invalid",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record-level failure. Serializes as `{"type": kind, "data"?: detail}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEntry {
    #[serde(rename = "type")]
    kind: ErrorKind,
    #[serde(rename = "data", default, skip_serializing_if = "Option::is_none")]
    detail: Option<Value>,
}

impl ErrorEntry {
    pub fn new(kind: ErrorKind, detail: Option<Value>) -> Self {
        Self { kind, detail }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn detail(&self) -> Option<&Value> {
        self.detail.as_ref()
    }

    /// The wire shape of this error.
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        out.insert("type".to_string(), Value::from(self.kind.as_str()));
        if let Some(detail) = &self.detail {
            out.insert("data".to_string(), detail.clone());
        }
        Value::Object(out)
    }
}

/// How records are rendered by [`ResultSet::serialize`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SerializeOptions<'a> {
    /// Emit bare ids instead of attribute objects.
    pub only_ids: bool,
    /// Attributes to expose; `None` exposes everything.
    pub fields: Option<&'a FilterMode>,
}

/// Results of one operation on one resource.
///
/// Both maps keep first-insertion order; overwriting a key leaves it in
/// place.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    records: IndexMap<RecordKey, Record>,
    errors: IndexMap<RecordKey, ErrorEntry>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `record` under `key`, replacing any earlier record.
    pub fn set(&mut self, key: RecordKey, record: Record) {
        self.records.insert(key, record);
    }

    /// Stores an error under `key`, replacing any earlier error.
    pub fn set_error(&mut self, key: RecordKey, kind: ErrorKind, detail: Option<Value>) {
        self.errors.insert(key, ErrorEntry::new(kind, detail));
    }

    /// Stores `record` and, when it carries validation errors, an
    /// [`ErrorKind::Invalid`] entry with those errors as detail.
    pub fn set_validated(&mut self, key: RecordKey, record: Record) {
        let detail = (!record.is_valid()).then(|| record.errors.to_value());
        self.set(key.clone(), record);
        if let Some(detail) = detail {
            self.set_error(key, ErrorKind::Invalid, Some(detail));
        }
    }

    pub fn record(&self, key: &RecordKey) -> Option<&Record> {
        self.records.get(key)
    }

    pub fn error(&self, key: &RecordKey) -> Option<&ErrorEntry> {
        self.errors.get(key)
    }

    pub fn records(&self) -> impl Iterator<Item = (&RecordKey, &Record)> {
        self.records.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = (&RecordKey, &ErrorEntry)> {
        self.errors.iter()
    }

    /// Records that will actually be serialized (no error under their key).
    pub fn successes(&self) -> impl Iterator<Item = (&RecordKey, &Record)> {
        let errors = &self.errors;
        self.records.iter().filter(move |(key, _)| !errors.contains_key(*key))
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.errors.is_empty()
    }

    /// Renders `{name: [...], errors?: {name: {key: error}}}`.
    pub fn serialize(&self, name: &str, options: &SerializeOptions<'_>) -> Map<String, Value> {
        let all_fields = FilterMode::None;
        let fields = options.fields.unwrap_or(&all_fields);

        let records = self
            .successes()
            .map(|(_, record)| {
                if options.only_ids {
                    record.id.as_ref().map_or(Value::Null, RecordId::to_value)
                } else {
                    record.to_json(fields)
                }
            })
            .collect();

        let mut out = Map::new();
        out.insert(name.to_string(), Value::Array(records));

        if self.has_errors() {
            let errors: Map<String, Value> = self
                .errors()
                .map(|(key, error)| (key.to_string(), error.to_value()))
                .collect();
            let mut by_resource = Map::new();
            by_resource.insert(name.to_string(), Value::Object(errors));
            out.insert(ERRORS_KEY.to_string(), Value::Object(by_resource));
        }
        out
    }
}
