use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Record, ValidationErrors};

const BLANK: &str = "can't be blank";

/// Describes a model's structure for storage backends that validate records
/// themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSchema {
    /// Model name, e.g. `"Task"`.
    pub name: String,
    /// Persisted fields. Empty means any field is accepted.
    #[serde(default)]
    pub fields: Vec<String>,
    /// Fields that must be present and non-blank on save.
    #[serde(default)]
    pub required: Vec<String>,
    /// Refuses destruction of records whose guard field is truthy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destroy_guard: Option<DestroyGuard>,
}

/// Blocks `destroy` while `field` holds a truthy value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DestroyGuard {
    pub field: String,
    pub message: String,
}

impl ModelSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            required: Vec::new(),
            destroy_guard: None,
        }
    }

    /// Declares the persisted fields.
    pub fn with_fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Declares a field that must not be blank.
    pub fn require(mut self, field: &str) -> Self {
        self.required.push(field.to_string());
        self
    }

    /// Installs a destroy guard.
    pub fn guard_destroy(mut self, field: &str, message: &str) -> Self {
        self.destroy_guard = Some(DestroyGuard {
            field: field.to_string(),
            message: message.to_string(),
        });
        self
    }

    /// Whether `field` is persisted by this model.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.is_empty() || self.fields.iter().any(|f| f == field)
    }

    /// Keeps only declared fields.
    pub fn restrict(&self, mut attributes: Map<String, Value>) -> Map<String, Value> {
        if !self.fields.is_empty() {
            attributes.retain(|key, _| self.has_field(key));
        }
        attributes
    }

    /// Checks required fields.
    pub fn validate(&self, record: &Record) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for field in &self.required {
            if is_blank(record.get(field)) {
                errors.add(field.clone(), BLANK);
            }
        }
        errors
    }

    /// Checks the destroy guard.
    pub fn validate_destroy(&self, record: &Record) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Some(guard) = &self.destroy_guard {
            if is_truthy(record.get(&guard.field)) {
                errors.add_base(guard.message.clone());
            }
        }
        errors
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.as_str(), "true" | "1"),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(_) => true,
    }
}
