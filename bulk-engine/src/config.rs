//! Declarative application configuration.
//!
//! A JSON file lists the resources to serve, the models backing them and
//! per-resource bindings. Every declared model is served by a
//! [`MemoryModel`]; applications with other backends assemble an
//! [`Application`] through [`Application::builder`] directly.

use bulk_model::{FilterMode, ModelSchema};
use bulk_storage::MemoryModel;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::error::BulkError;
use crate::registry::{Application, ApplicationBuilder, Resolution, ResourceDefinition};

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Application(#[from] BulkError),
}

/// Binding of one resource name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BindingConfig {
    /// Model serving the resource; inferred from the name when absent.
    pub model: Option<String>,
    /// Attributes clients may write.
    pub attributes: FilterMode,
    /// Attributes responses expose.
    pub serialize: FilterMode,
}

/// Root of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Resource allow-list. Empty serves every name a request carries.
    pub resources: Vec<String>,
    /// Reject requests naming undeclared resources.
    pub strict: bool,
    pub models: Vec<ModelSchema>,
    pub bindings: BTreeMap<String, BindingConfig>,
}

impl AppConfig {
    /// Reads and parses the file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("loaded configuration from {}", path.display());
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn resolution(&self) -> Resolution {
        if self.strict {
            Resolution::Strict
        } else {
            Resolution::Lenient
        }
    }

    /// Checks cross references the file format cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        for schema in &self.models {
            if schema.name.is_empty() {
                return Err(ConfigError::Invalid("model with empty name".into()));
            }
            if !seen.insert(schema.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "model `{}` declared twice",
                    schema.name
                )));
            }
            if let Some(guard) = &schema.destroy_guard
                && !schema.has_field(&guard.field)
            {
                return Err(ConfigError::Invalid(format!(
                    "destroy guard of `{}` names undeclared field `{}`",
                    schema.name, guard.field
                )));
            }
        }

        for (resource, binding) in &self.bindings {
            if let Some(model) = &binding.model
                && !seen.contains(model.as_str())
            {
                return Err(ConfigError::Invalid(format!(
                    "resource `{resource}` is bound to undeclared model `{model}`"
                )));
            }
        }
        Ok(())
    }

    /// Builder with every model and binding registered. Callers may still
    /// install a gate or policies before building.
    pub fn into_builder(self) -> Result<ApplicationBuilder, ConfigError> {
        self.validate()?;
        let resolution = self.resolution();

        let mut builder = Application::builder()
            .resources(self.resources)
            .resolution(resolution);
        for schema in self.models {
            builder = builder.model(MemoryModel::new(schema));
        }
        for (resource, binding) in self.bindings {
            let mut definition = ResourceDefinition::new()
                .attributes(binding.attributes)
                .serialize(binding.serialize);
            if let Some(model) = binding.model {
                definition = definition.model(model);
            }
            builder = builder.resource(resource, definition);
        }
        Ok(builder)
    }

    pub fn build(self) -> Result<Application, ConfigError> {
        Ok(self.into_builder()?.build()?)
    }
}
