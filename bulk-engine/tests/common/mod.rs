#![allow(dead_code)]

use bulk_engine::{Application, ApplicationBuilder, BulkRequest};
use bulk_model::{Model, ModelSchema, Record, RecordId, StoreResult};
use bulk_storage::MemoryModel;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn attrs(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

pub fn task_schema() -> ModelSchema {
    ModelSchema::new("Task")
        .with_fields(&["title", "done", "invulnerable", "owner"])
        .require("title")
        .guard_destroy("invulnerable", "You can't destroy me noob!")
}

pub fn project_schema() -> ModelSchema {
    ModelSchema::new("Project").with_fields(&["name"]).require("name")
}

/// Task table seeded with `Foo` (id 1) and `Bar` (id 2).
pub fn make_tasks() -> Arc<CountingModel> {
    let tasks = MemoryModel::new(task_schema());
    tasks.insert(attrs(json!({"title": "Foo"}))).unwrap();
    tasks.insert(attrs(json!({"title": "Bar"}))).unwrap();
    Arc::new(CountingModel::new(tasks))
}

/// Project table seeded with `Bulk` (id 1) and `Sproutcore` (id 2).
pub fn make_projects() -> Arc<CountingModel> {
    let projects = MemoryModel::new(project_schema());
    projects.insert(attrs(json!({"name": "Bulk"}))).unwrap();
    projects.insert(attrs(json!({"name": "Sproutcore"}))).unwrap();
    Arc::new(CountingModel::new(projects))
}

/// Builder pre-registered with the seeded task and project tables.
pub fn make_builder(tasks: &Arc<CountingModel>, projects: &Arc<CountingModel>) -> ApplicationBuilder {
    Application::builder()
        .shared_model(tasks.clone())
        .shared_model(projects.clone())
}

pub fn make_app() -> (Application, Arc<CountingModel>, Arc<CountingModel>) {
    let tasks = make_tasks();
    let projects = make_projects();
    let app = make_builder(&tasks, &projects).build().unwrap();
    (app, tasks, projects)
}

pub fn request(method: &str, params: Value) -> BulkRequest {
    BulkRequest::from_json(method, params)
}

/// Wraps a [`MemoryModel`] and counts storage calls.
pub struct CountingModel {
    pub inner: MemoryModel,
    finds: AtomicUsize,
    saves: AtomicUsize,
    destroys: AtomicUsize,
}

impl CountingModel {
    pub fn new(inner: MemoryModel) -> Self {
        Self {
            inner,
            finds: AtomicUsize::new(0),
            saves: AtomicUsize::new(0),
            destroys: AtomicUsize::new(0),
        }
    }

    pub fn finds(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn destroys(&self) -> usize {
        self.destroys.load(Ordering::SeqCst)
    }

    /// Storage calls of any kind.
    pub fn calls(&self) -> usize {
        self.finds() + self.saves() + self.destroys()
    }

    pub fn row(&self, id: i64) -> Option<Record> {
        self.inner.find_one(&RecordId::Int(id)).unwrap()
    }

    pub fn len(&self) -> usize {
        self.inner.len().unwrap()
    }
}

impl Model for CountingModel {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn find(&self, ids: &[RecordId]) -> StoreResult<Vec<Record>> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.find(ids)
    }

    fn all(&self) -> StoreResult<Vec<Record>> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.all()
    }

    fn build(&self, attributes: Map<String, Value>) -> Record {
        self.inner.build(attributes)
    }

    fn save(&self, record: &mut Record) -> StoreResult<bool> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(record)
    }

    fn destroy(&self, record: &mut Record) -> StoreResult<bool> {
        self.destroys.fetch_add(1, Ordering::SeqCst);
        self.inner.destroy(record)
    }
}
