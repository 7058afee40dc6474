//! In-memory storage layer for the bulk API.
//!
//! Provides [`MemoryModel`], a [`Model`](bulk_model::Model) whose rows live in
//! a process-local table. Validation is driven by the model's
//! [`ModelSchema`](bulk_model::ModelSchema): required fields are checked on
//! save and the destroy guard on destroy.
//!
//! # Architecture
//!
//! - One `MemoryModel` per record type, registered with the engine by name
//! - Rows are JSON attribute maps keyed by [`RecordId`](bulk_model::RecordId)
//! - Integer ids are assigned from a per-model counter on first save

mod memory;

pub use memory::MemoryModel;
