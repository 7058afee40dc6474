use serde_json::{Map, Value};
use std::slice;

use crate::{Record, RecordId, StoreResult};

/// Storage contract the bulk engine drives.
///
/// A `Model` stands for one record type in one backend ("Task", "Project").
/// Validation is part of the contract: `save` and `destroy` report refused
/// writes by filling [`Record::errors`] and returning `Ok(false)`; an `Err`
/// is reserved for backend failures.
pub trait Model: Send + Sync {
    /// Model name the registry resolves, e.g. `"Task"`.
    fn name(&self) -> &str;

    /// Fetches the records with the given ids. Missing ids are skipped.
    fn find(&self, ids: &[RecordId]) -> StoreResult<Vec<Record>>;

    /// Fetches every record.
    fn all(&self) -> StoreResult<Vec<Record>>;

    /// Fetches a single record.
    fn find_one(&self, id: &RecordId) -> StoreResult<Option<Record>> {
        Ok(self.find(slice::from_ref(id))?.into_iter().next())
    }

    /// Instantiates an unsaved record.
    fn build(&self, attributes: Map<String, Value>) -> Record {
        Record::new(attributes)
    }

    /// Validates and persists `record`, assigning an id when it has none.
    /// Returns `Ok(false)` when validation refused the write.
    fn save(&self, record: &mut Record) -> StoreResult<bool>;

    /// Removes `record` from storage.
    /// Returns `Ok(false)` when a guard refused the removal.
    fn destroy(&self, record: &mut Record) -> StoreResult<bool>;
}
