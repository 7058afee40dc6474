//! Incoming bulk requests and the verb → action map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Bulk operation selected by the HTTP verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Get,
    Create,
    Update,
    Delete,
}

impl Action {
    /// Maps an HTTP method to an action (`GET→get, POST→create,
    /// PUT→update, DELETE→delete`). Anything else has no action.
    pub fn from_method(method: &str) -> Option<Self> {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Create),
            "PUT" => Some(Self::Update),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded bulk request: verb, parameter tree and headers.
///
/// The parameter tree maps resource names to their batch payloads. Headers
/// are kept so request gates and policies can authenticate the caller.
#[derive(Debug, Clone, Default)]
pub struct BulkRequest {
    method: String,
    params: Map<String, Value>,
    headers: Vec<(String, String)>,
}

impl BulkRequest {
    pub fn new(method: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            method: method.into(),
            params,
            headers: Vec::new(),
        }
    }

    /// Builds a request from a JSON object literal; non-objects yield no params.
    pub fn from_json(method: impl Into<String>, params: Value) -> Self {
        let params = match params {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::new(method, params)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// The action for this request's verb, if any.
    pub fn action(&self) -> Option<Action> {
        Action::from_method(&self.method)
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// First header with `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
