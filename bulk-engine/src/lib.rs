//! Bulk CRUD engine.
//!
//! Executes get/create/update/delete over many records of many resource
//! types in one request and reports per-record outcomes:
//! - [`ResultSet`] collects records and [`ErrorEntry`] failures per resource
//! - [`RecordHandler`] runs one action over one resource with two-level
//!   authorization (batch, then record)
//! - [`Dispatcher`] maps the HTTP verb to an action, runs every resource
//!   named by the request and merges the results
//! - [`Application`] holds the models, resource definitions, request gate
//!   and resolution mode
//!
//! The engine is synchronous and transport-agnostic; `bulk-server` puts it
//! behind HTTP.

pub mod batch;
mod config;
mod dispatcher;
mod error;
mod handler;
pub mod inflect;
pub mod params;
mod policy;
mod registry;
mod request;
mod result_set;

pub use batch::IdSelection;
pub use config::{AppConfig, BindingConfig, ConfigError};
pub use dispatcher::{Dispatcher, merge_fragment};
pub use error::{BulkError, BulkResult};
pub use handler::RecordHandler;
pub use policy::{AllowAll, OpenGate, RequestGate, ResourcePolicy};
pub use registry::{Application, ApplicationBuilder, Resolution, ResourceDefinition};
pub use request::{Action, BulkRequest};
pub use result_set::{ERRORS_KEY, ErrorEntry, ErrorKind, RecordKey, ResultSet, SerializeOptions};
