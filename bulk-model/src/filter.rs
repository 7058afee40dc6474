use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Allow/deny filter over the keys of an attribute map.
///
/// Used twice per resource: once for the attributes a client may write and
/// once for the attributes a response may expose.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Every key passes.
    #[default]
    None,
    /// Only the listed keys pass.
    Allow(BTreeSet<String>),
    /// Every key except the listed ones passes.
    Deny(BTreeSet<String>),
}

impl FilterMode {
    /// Builds an allow-list filter.
    pub fn allow<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Allow(fields.into_iter().map(Into::into).collect())
    }

    /// Builds a deny-list filter.
    pub fn deny<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Deny(fields.into_iter().map(Into::into).collect())
    }

    /// Whether `key` passes the filter.
    pub fn permits(&self, key: &str) -> bool {
        match self {
            Self::None => true,
            Self::Allow(fields) => fields.contains(key),
            Self::Deny(fields) => !fields.contains(key),
        }
    }

    /// Drops every entry whose key does not pass, keeping order.
    pub fn apply(&self, mut attributes: Map<String, Value>) -> Map<String, Value> {
        if !matches!(self, Self::None) {
            attributes.retain(|key, _| self.permits(key));
        }
        attributes
    }
}
