//! Record model for the bulk API.
//!
//! Defines the storage-facing types the bulk engine is written against:
//! - [`Record`]: the generic data container (id, JSON attributes, validation errors)
//! - [`RecordId`]: a storage-assigned identifier (integer or string)
//! - [`Model`]: the storage contract (find, build, save, destroy)
//! - [`ModelSchema`]: declares a model's fields, required fields and destroy guard
//! - [`FilterMode`]: allow/deny filtering of attribute maps
//!
//! The engine never talks to a database directly; every storage backend is a
//! [`Model`] implementation registered under its model name.

mod error;
mod filter;
mod model;
mod record;
mod schema;
mod validation;

pub use error::{StoreError, StoreResult};
pub use filter::FilterMode;
pub use model::Model;
pub use record::{LOCAL_ID_KEY, Record, RecordId};
pub use schema::{DestroyGuard, ModelSchema};
pub use validation::ValidationErrors;
