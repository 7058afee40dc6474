use bulk_model::{Model, Record, StoreResult};

use crate::batch::IdSelection;
use crate::request::{Action, BulkRequest};

/// Authorization and lifecycle hooks for one resource.
///
/// Every method has a permissive default; implement only what a resource
/// needs:
/// - `authorize_batch` runs once per operation, before any record is touched
/// - `authorize_record` runs once per record that survived the batch check
/// - `prepare_record` may adjust a record before it is authorized
/// - `fetch` replaces the default id/all lookup of `get`
pub trait ResourcePolicy: Send + Sync {
    /// Collection-level check. Returning `false` marks every key of the
    /// batch forbidden and skips the operation entirely.
    fn authorize_batch(&self, request: &BulkRequest, action: Action, model: &dyn Model) -> bool {
        let _ = (request, action, model);
        true
    }

    /// Record-level check. Returning `false` marks only this record
    /// forbidden. For `create` the record is not saved yet.
    fn authorize_record(&self, request: &BulkRequest, action: Action, record: &Record) -> bool {
        let _ = (request, action, record);
        true
    }

    /// Called on every built or loaded record of `create`, `update` and
    /// `delete` before `authorize_record`.
    fn prepare_record(&self, request: &BulkRequest, action: Action, record: &mut Record) {
        let _ = (request, action, record);
    }

    /// Custom fetch strategy for `get`. `None` uses the model's lookup.
    fn fetch(
        &self,
        request: &BulkRequest,
        model: &dyn Model,
        selection: &IdSelection,
    ) -> Option<StoreResult<Vec<Record>>> {
        let _ = (request, model, selection);
        None
    }
}

/// Policy that allows everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl ResourcePolicy for AllowAll {}

/// Request-level check that runs once before any resource is dispatched.
pub trait RequestGate: Send + Sync {
    fn allow(&self, request: &BulkRequest) -> bool;
}

impl<F> RequestGate for F
where
    F: Fn(&BulkRequest) -> bool + Send + Sync,
{
    fn allow(&self, request: &BulkRequest) -> bool {
        self(request)
    }
}

/// Gate that lets every request through.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenGate;

impl RequestGate for OpenGate {
    fn allow(&self, _request: &BulkRequest) -> bool {
        true
    }
}
