//! Application registry: models, resource definitions and resolution rules.
//!
//! Resource names are resolved to models explicitly. A resource either
//! names its model in its [`ResourceDefinition`], or the model name is
//! inferred from the resource name (`tasks` → `Task`) and looked up among
//! the registered models. When neither yields a model the application is
//! misconfigured and resolution fails loudly.

use bulk_model::{FilterMode, Model};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::dispatcher::Dispatcher;
use crate::error::{BulkError, BulkResult};
use crate::handler::RecordHandler;
use crate::inflect;
use crate::policy::{AllowAll, OpenGate, RequestGate, ResourcePolicy};
use crate::request::BulkRequest;
use crate::result_set::ERRORS_KEY;

/// What to do with a resource name nobody declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
    /// Serve it with the default definition.
    #[default]
    Lenient,
    /// Reject the request.
    Strict,
}

/// Per-resource configuration: model binding, filters and policy.
#[derive(Clone)]
pub struct ResourceDefinition {
    model: Option<String>,
    attributes: FilterMode,
    serialize: FilterMode,
    policy: Arc<dyn ResourcePolicy>,
}

impl Default for ResourceDefinition {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ResourceDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDefinition")
            .field("model", &self.model)
            .field("attributes", &self.attributes)
            .field("serialize", &self.serialize)
            .finish_non_exhaustive()
    }
}

impl ResourceDefinition {
    pub fn new() -> Self {
        Self {
            model: None,
            attributes: FilterMode::None,
            serialize: FilterMode::None,
            policy: Arc::new(AllowAll),
        }
    }

    /// Binds the resource to a model by name instead of inferring it.
    pub fn model(mut self, name: impl Into<String>) -> Self {
        self.model = Some(name.into());
        self
    }

    /// Filters the attributes clients may write.
    pub fn attributes(mut self, filter: FilterMode) -> Self {
        self.attributes = filter;
        self
    }

    /// Filters the attributes responses expose.
    pub fn serialize(mut self, filter: FilterMode) -> Self {
        self.serialize = filter;
        self
    }

    pub fn policy(mut self, policy: impl ResourcePolicy + 'static) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    pub fn model_binding(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub(crate) fn attribute_filter(&self) -> &FilterMode {
        &self.attributes
    }

    pub(crate) fn serialize_fields(&self) -> &FilterMode {
        &self.serialize
    }

    pub(crate) fn resource_policy(&self) -> &dyn ResourcePolicy {
        self.policy.as_ref()
    }
}

/// Immutable application state shared by all requests.
pub struct Application {
    models: BTreeMap<String, Arc<dyn Model>>,
    resources: Vec<String>,
    definitions: BTreeMap<String, ResourceDefinition>,
    default_definition: ResourceDefinition,
    gate: Arc<dyn RequestGate>,
    resolution: Resolution,
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("models", &self.models.keys().collect::<Vec<_>>())
            .field("resources", &self.resources)
            .field("definitions", &self.definitions)
            .field("resolution", &self.resolution)
            .finish_non_exhaustive()
    }
}

impl Application {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::default()
    }

    /// Declared resource names; empty accepts every name in a request.
    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn gate(&self) -> &dyn RequestGate {
        self.gate.as_ref()
    }

    pub fn model(&self, name: &str) -> Option<Arc<dyn Model>> {
        self.models.get(name).cloned()
    }

    /// Whether `name` is declared, by the resource list or a definition.
    pub fn is_declared(&self, name: &str) -> bool {
        self.definitions.contains_key(name) || self.resources.iter().any(|r| r == name)
    }

    /// The request's resource payloads this application serves, in request
    /// order. Undeclared names are dropped when a resource list exists.
    pub fn select_resources<'p>(&self, params: &'p Map<String, Value>) -> Vec<(&'p str, &'p Value)> {
        params
            .iter()
            .filter(|(name, _)| {
                if name.as_str() == ERRORS_KEY {
                    debug!("ignoring reserved parameter `{}`", ERRORS_KEY);
                    return false;
                }
                self.resources.is_empty() || self.resources.iter().any(|r| r == *name)
            })
            .map(|(name, payload)| (name.as_str(), payload))
            .collect()
    }

    /// Definition serving `resource_name`.
    pub fn definition(&self, resource_name: &str) -> BulkResult<&ResourceDefinition> {
        match self.definitions.get(resource_name) {
            Some(definition) => Ok(definition),
            None if self.resolution == Resolution::Strict && !self.is_declared(resource_name) => {
                Err(BulkError::UnknownResource(resource_name.to_string()))
            }
            None => Ok(&self.default_definition),
        }
    }

    /// Model serving `resource_name` under `definition`.
    pub fn resolve_model(
        &self,
        resource_name: &str,
        definition: &ResourceDefinition,
    ) -> BulkResult<Arc<dyn Model>> {
        let model_name = match definition.model_binding() {
            Some(bound) => bound.to_string(),
            None => inflect::model_name(resource_name),
        };
        self.model(&model_name).ok_or_else(|| BulkError::UnresolvedModel {
            resource: resource_name.to_string(),
            model: model_name,
        })
    }

    /// Handler for `resource_name` within `request`.
    pub fn handler<'a>(
        &'a self,
        request: &'a BulkRequest,
        resource_name: &str,
    ) -> BulkResult<RecordHandler<'a>> {
        let definition = self.definition(resource_name)?;
        let model = self.resolve_model(resource_name, definition)?;
        Ok(RecordHandler::new(request, resource_name, model, definition))
    }

    /// Runs a bulk request. See [`Dispatcher::dispatch`].
    pub fn call(&self, request: &BulkRequest) -> BulkResult<Value> {
        Dispatcher::new(self).dispatch(request)
    }
}

/// Assembles an [`Application`].
pub struct ApplicationBuilder {
    models: BTreeMap<String, Arc<dyn Model>>,
    duplicate_models: Vec<String>,
    resources: Vec<String>,
    definitions: BTreeMap<String, ResourceDefinition>,
    default_definition: ResourceDefinition,
    gate: Arc<dyn RequestGate>,
    resolution: Resolution,
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self {
            models: BTreeMap::new(),
            duplicate_models: Vec::new(),
            resources: Vec::new(),
            definitions: BTreeMap::new(),
            default_definition: ResourceDefinition::new(),
            gate: Arc::new(OpenGate),
            resolution: Resolution::default(),
        }
    }
}

impl ApplicationBuilder {
    /// Registers a model under its own name.
    pub fn model(self, model: impl Model + 'static) -> Self {
        self.shared_model(Arc::new(model))
    }

    /// Registers a model the caller keeps a handle to.
    pub fn shared_model(mut self, model: Arc<dyn Model>) -> Self {
        let name = model.name().to_string();
        if self.models.insert(name.clone(), model).is_some() {
            self.duplicate_models.push(name);
        }
        self
    }

    /// Declares the resource names the application serves.
    pub fn resources<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources = names.into_iter().map(Into::into).collect();
        self
    }

    /// Configures one resource.
    pub fn resource(mut self, name: impl Into<String>, definition: ResourceDefinition) -> Self {
        self.definitions.insert(name.into(), definition);
        self
    }

    /// Definition for resources without their own.
    pub fn default_resource(mut self, definition: ResourceDefinition) -> Self {
        self.default_definition = definition;
        self
    }

    pub fn gate(mut self, gate: impl RequestGate + 'static) -> Self {
        self.gate = Arc::new(gate);
        self
    }

    pub fn resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Validates the configuration. Every declared resource must resolve
    /// to a registered model.
    pub fn build(self) -> BulkResult<Application> {
        if let Some(name) = self.duplicate_models.first() {
            return Err(BulkError::Config(format!("model `{name}` registered twice")));
        }
        if self.resources.iter().any(|r| r == ERRORS_KEY) || self.definitions.contains_key(ERRORS_KEY) {
            return Err(BulkError::Config(format!("`{ERRORS_KEY}` is a reserved resource name")));
        }

        let app = Application {
            models: self.models,
            resources: self.resources,
            definitions: self.definitions,
            default_definition: self.default_definition,
            gate: self.gate,
            resolution: self.resolution,
        };

        let declared = app.resources.iter().chain(app.definitions.keys());
        for name in declared {
            let definition = app.definition(name)?;
            let model = app.resolve_model(name, definition)?;
            debug!("resource `{}` served by model `{}`", name, model.name());
        }

        info!(
            "bulk application ready: {} models, {} listed resources, {} definitions, {:?} resolution",
            app.models.len(),
            app.resources.len(),
            app.definitions.len(),
            app.resolution
        );
        Ok(app)
    }
}
