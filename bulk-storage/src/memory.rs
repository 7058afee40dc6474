use bulk_model::{Model, ModelSchema, Record, RecordId, StoreError, StoreResult};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

type Rows = BTreeMap<RecordId, Map<String, Value>>;

/// Process-local table for one model.
pub struct MemoryModel {
    schema: ModelSchema,
    rows: RwLock<Rows>,
    next_id: AtomicI64,
}

impl MemoryModel {
    /// Creates an empty table described by `schema`.
    pub fn new(schema: ModelSchema) -> Self {
        Self {
            schema,
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    /// Inserts a row without validation and returns its new id.
    pub fn insert(&self, attributes: Map<String, Value>) -> StoreResult<RecordId> {
        let id = self.allocate_id();
        self.write()?.insert(id.clone(), self.schema.restrict(attributes));
        Ok(id)
    }

    /// Number of stored rows.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.read()?.is_empty())
    }

    fn allocate_id(&self) -> RecordId {
        RecordId::Int(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Keeps the id counter ahead of explicitly chosen integer ids.
    fn observe_id(&self, id: &RecordId) {
        if let RecordId::Int(n) = id {
            self.next_id.fetch_max(n + 1, Ordering::SeqCst);
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Rows>> {
        self.rows
            .read()
            .map_err(|_| StoreError::Unavailable(format!("{} table lock poisoned", self.schema.name)))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Rows>> {
        self.rows
            .write()
            .map_err(|_| StoreError::Unavailable(format!("{} table lock poisoned", self.schema.name)))
    }
}

impl Model for MemoryModel {
    fn name(&self) -> &str {
        &self.schema.name
    }

    fn find(&self, ids: &[RecordId]) -> StoreResult<Vec<Record>> {
        let rows = self.read()?;
        let mut found: Vec<Record> = Vec::with_capacity(ids.len());
        for id in ids {
            if found.iter().any(|r| r.id.as_ref() == Some(id)) {
                continue;
            }
            if let Some(attributes) = rows.get(id) {
                found.push(Record::persisted(id.clone(), attributes.clone()));
            }
        }
        Ok(found)
    }

    fn all(&self) -> StoreResult<Vec<Record>> {
        Ok(self
            .read()?
            .iter()
            .map(|(id, attributes)| Record::persisted(id.clone(), attributes.clone()))
            .collect())
    }

    fn build(&self, attributes: Map<String, Value>) -> Record {
        Record::new(self.schema.restrict(attributes))
    }

    fn save(&self, record: &mut Record) -> StoreResult<bool> {
        record.attributes = self.schema.restrict(std::mem::take(&mut record.attributes));
        record.errors = self.schema.validate(record);
        if !record.is_valid() {
            debug!("{} save refused: {:?}", self.schema.name, record.errors);
            return Ok(false);
        }

        let id = match &record.id {
            Some(id) => {
                self.observe_id(id);
                id.clone()
            }
            None => self.allocate_id(),
        };
        self.write()?.insert(id.clone(), record.attributes.clone());
        record.id = Some(id);
        Ok(true)
    }

    fn destroy(&self, record: &mut Record) -> StoreResult<bool> {
        record.errors = self.schema.validate_destroy(record);
        if !record.is_valid() {
            debug!("{} destroy refused: {:?}", self.schema.name, record.errors);
            return Ok(false);
        }
        if let Some(id) = &record.id {
            self.write()?.remove(id);
        }
        Ok(true)
    }
}
