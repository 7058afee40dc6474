//! Top-level dispatch of a bulk request across resources.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{BulkError, BulkResult};
use crate::registry::Application;
use crate::request::BulkRequest;
use crate::result_set::ERRORS_KEY;

/// Routes one request to the handlers of every resource it names and
/// merges their results into one document.
pub struct Dispatcher<'a> {
    app: &'a Application,
}

impl<'a> Dispatcher<'a> {
    pub fn new(app: &'a Application) -> Self {
        Self { app }
    }

    /// Runs `request`.
    ///
    /// Fails before touching any resource when the verb has no action
    /// ([`BulkError::MethodNotAllowed`]), the gate refuses the request
    /// ([`BulkError::Unauthorized`]) or a resource cannot be resolved.
    /// Record-level failures never fail the request; they are reported
    /// under `errors` in the returned document.
    pub fn dispatch(&self, request: &BulkRequest) -> BulkResult<Value> {
        let action = request
            .action()
            .ok_or_else(|| BulkError::MethodNotAllowed(request.method().to_string()))?;

        if !self.app.gate().allow(request) {
            debug!("request gate refused {} request", request.method());
            return Err(BulkError::Unauthorized);
        }

        // Resolve everything first so a misconfigured resource cannot leave
        // earlier resources half-processed.
        let handlers = self
            .app
            .select_resources(request.params())
            .into_iter()
            .map(|(name, payload)| Ok((self.app.handler(request, name)?, payload)))
            .collect::<BulkResult<Vec<_>>>()?;

        let mut response = Map::new();
        for (handler, payload) in handlers {
            debug!("{} {}", action, handler.resource_name());
            let fragment = handler.call(action, payload.clone())?;
            merge_fragment(&mut response, fragment);
        }
        Ok(Value::Object(response))
    }
}

/// Merges one resource's result into the aggregate response.
///
/// Resource keys are unioned; `errors` is merged per resource and then per
/// record key. Collisions cannot happen between distinct resources, so any
/// that does is logged and the later value kept.
pub fn merge_fragment(response: &mut Map<String, Value>, fragment: Map<String, Value>) {
    for (key, value) in fragment {
        if key != ERRORS_KEY {
            if response.insert(key.clone(), value).is_some() {
                warn!("resource `{}` appears twice in one response; keeping the last", key);
            }
            continue;
        }

        let Value::Object(by_resource) = value else {
            warn!("ignoring malformed `{}` fragment", ERRORS_KEY);
            continue;
        };
        let slot = response
            .entry(ERRORS_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        let Value::Object(errors) = slot else {
            warn!("`{}` in response is not a mapping; replacing it", ERRORS_KEY);
            *slot = Value::Object(by_resource);
            continue;
        };
        for (resource, incoming) in by_resource {
            match (errors.get_mut(&resource), incoming) {
                (Some(Value::Object(existing)), Value::Object(incoming)) => {
                    for (record_key, error) in incoming {
                        if existing.insert(record_key.clone(), error).is_some() {
                            warn!("duplicate error for `{}` record {}", resource, record_key);
                        }
                    }
                }
                (Some(_), incoming) => {
                    warn!("conflicting errors for `{}`; keeping the last", resource);
                    errors.insert(resource, incoming);
                }
                (None, incoming) => {
                    errors.insert(resource, incoming);
                }
            }
        }
    }
}
