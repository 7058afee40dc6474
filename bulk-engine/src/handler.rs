//! Per-resource bulk operations.
//!
//! A [`RecordHandler`] runs one action over one resource's batch and
//! reports the outcome as a serialized [`ResultSet`]. Every operation follows
//! the same protocol:
//!
//! 1. batch phase: `authorize_batch` once; on refusal every key is
//!    forbidden and storage is not touched
//! 2. record phase: per item, in submission order, `authorize_record`;
//!    a refusal only affects that item
//! 3. save/destroy, then validation errors are reported as `invalid`
//!
//! Records that do not exist are left out of the result without an error.

use bulk_model::{LOCAL_ID_KEY, Model, Record, RecordId};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

use crate::batch::{self, IdSelection};
use crate::error::BulkResult;
use crate::policy::ResourcePolicy;
use crate::registry::ResourceDefinition;
use crate::request::{Action, BulkRequest};
use crate::result_set::{ErrorKind, RecordKey, ResultSet, SerializeOptions};

/// Executes bulk actions for one resource within one request.
pub struct RecordHandler<'a> {
    request: &'a BulkRequest,
    resource_name: String,
    model: Arc<dyn Model>,
    definition: &'a ResourceDefinition,
}

impl<'a> RecordHandler<'a> {
    pub fn new(
        request: &'a BulkRequest,
        resource_name: impl Into<String>,
        model: Arc<dyn Model>,
        definition: &'a ResourceDefinition,
    ) -> Self {
        Self {
            request,
            resource_name: resource_name.into(),
            model,
            definition,
        }
    }

    /// Pluralized resource name, e.g. `tasks`.
    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    pub fn model(&self) -> &dyn Model {
        self.model.as_ref()
    }

    /// Decodes `payload` for `action` and runs it.
    pub fn call(&self, action: Action, payload: Value) -> BulkResult<Map<String, Value>> {
        match action {
            Action::Get => self.get(batch::selection(payload)),
            Action::Create => self.create(batch::attribute_sets(payload)),
            Action::Update => self.update(batch::attribute_sets(payload)),
            Action::Delete => self.delete(batch::ids(payload)),
        }
    }

    /// Fetches the selected records.
    pub fn get(&self, selection: IdSelection) -> BulkResult<Map<String, Value>> {
        let mut results = ResultSet::new();
        let keys = match &selection {
            IdSelection::All => Vec::new(),
            IdSelection::Ids(ids) => ids.iter().map(RecordKey::from).collect(),
        };

        if self.authorize_batch(Action::Get, keys, &mut results) {
            let records = match self.policy().fetch(self.request, self.model(), &selection) {
                Some(fetched) => fetched?,
                None => match &selection {
                    IdSelection::All => self.model.all()?,
                    IdSelection::Ids(ids) => self.model.find(ids)?,
                },
            };
            for record in records {
                let Some(id) = record.id.clone() else {
                    debug!("{}: fetch returned an unsaved record, skipping", self.resource_name);
                    continue;
                };
                let key = RecordKey::from(&id);
                if self.authorize_record(Action::Get, &key, &record, &mut results) {
                    results.set(key, record);
                }
            }
        }

        Ok(self.serialize(&results, false))
    }

    /// Creates one record per attribute mapping, keyed by `_local_id`.
    pub fn create(&self, items: Vec<Map<String, Value>>) -> BulkResult<Map<String, Value>> {
        let mut results = ResultSet::new();
        let keys = items
            .iter()
            .map(|attributes| RecordKey::from_token(attributes.get(LOCAL_ID_KEY)))
            .collect();

        if self.authorize_batch(Action::Create, keys, &mut results) {
            for mut attributes in items {
                let local_id = attributes.remove(LOCAL_ID_KEY).filter(|v| !v.is_null());
                let key = RecordKey::from_token(local_id.as_ref());
                attributes.remove("id");

                let mut record = self.model.build(self.definition.attribute_filter().apply(attributes));
                record.local_id = local_id;
                self.policy().prepare_record(self.request, Action::Create, &mut record);

                if self.authorize_record(Action::Create, &key, &record, &mut results) {
                    self.model.save(&mut record)?;
                    results.set_validated(key, record);
                }
            }
        }

        Ok(self.serialize(&results, false))
    }

    /// Applies each attribute mapping to the record named by its `id`.
    pub fn update(&self, items: Vec<Map<String, Value>>) -> BulkResult<Map<String, Value>> {
        let mut results = ResultSet::new();
        let targets: Vec<(RecordId, Map<String, Value>)> = items
            .into_iter()
            .filter_map(|mut attributes| {
                attributes.remove(LOCAL_ID_KEY);
                let id = attributes.get("id").and_then(RecordId::from_value);
                if id.is_none() {
                    debug!("{}: update item without id, skipping", self.resource_name);
                }
                id.map(|id| (id, attributes))
            })
            .collect();
        let keys = targets.iter().map(|(id, _)| RecordKey::from(id)).collect();

        if self.authorize_batch(Action::Update, keys, &mut results) {
            for (id, attributes) in targets {
                let Some(mut record) = self.model.find_one(&id)? else {
                    debug!("{}: update target {} not found", self.resource_name, id);
                    continue;
                };
                record.assign(self.definition.attribute_filter().apply(attributes));
                self.policy().prepare_record(self.request, Action::Update, &mut record);

                let key = RecordKey::from(&id);
                if self.authorize_record(Action::Update, &key, &record, &mut results) {
                    self.model.save(&mut record)?;
                    results.set_validated(key, record);
                }
            }
        }

        Ok(self.serialize(&results, false))
    }

    /// Destroys the records with the given ids. Reports bare ids.
    pub fn delete(&self, ids: Vec<RecordId>) -> BulkResult<Map<String, Value>> {
        let mut results = ResultSet::new();
        let keys = ids.iter().map(RecordKey::from).collect();

        if self.authorize_batch(Action::Delete, keys, &mut results) {
            for id in ids {
                let Some(mut record) = self.model.find_one(&id)? else {
                    debug!("{}: delete target {} not found", self.resource_name, id);
                    continue;
                };
                self.policy().prepare_record(self.request, Action::Delete, &mut record);

                let key = RecordKey::from(&id);
                if self.authorize_record(Action::Delete, &key, &record, &mut results) {
                    self.model.destroy(&mut record)?;
                    results.set_validated(key, record);
                }
            }
        }

        Ok(self.serialize(&results, true))
    }

    fn policy(&self) -> &dyn ResourcePolicy {
        self.definition.resource_policy()
    }

    fn authorize_batch(&self, action: Action, keys: Vec<RecordKey>, results: &mut ResultSet) -> bool {
        if self.policy().authorize_batch(self.request, action, self.model()) {
            return true;
        }
        debug!(
            "{}: {} refused for the whole batch ({} keys)",
            self.resource_name,
            action,
            keys.len()
        );
        for key in keys {
            results.set_error(key, ErrorKind::Forbidden, None);
        }
        false
    }

    fn authorize_record(
        &self,
        action: Action,
        key: &RecordKey,
        record: &Record,
        results: &mut ResultSet,
    ) -> bool {
        if self.policy().authorize_record(self.request, action, record) {
            return true;
        }
        debug!("{}: {} refused for {}", self.resource_name, action, key);
        results.set_error(key.clone(), ErrorKind::Forbidden, None);
        false
    }

    fn serialize(&self, results: &ResultSet, only_ids: bool) -> Map<String, Value> {
        let options = SerializeOptions {
            only_ids,
            fields: Some(self.definition.serialize_fields()),
        };
        results.serialize(&self.resource_name, &options)
    }
}
