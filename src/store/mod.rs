//! Persistence collaborator for tasks, labels and their join table.
//!
//! Services only talk to [`EntityStore`]; the Postgres and in-memory backends
//! are interchangeable behind it.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{LabelRecord, NewTask, TaskRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("corrupt row: {0}")]
    Corrupt(String),
    #[error("record {0} vanished during update")]
    Missing(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Short backend name, reported by the health endpoint.
    fn kind(&self) -> &'static str;

    async fn insert_label(&self, name: &str, color: &str) -> StoreResult<LabelRecord>;
    async fn find_label(&self, id: i32) -> StoreResult<Option<LabelRecord>>;
    /// Labels whose id is in `ids`. Unknown ids are skipped.
    async fn find_labels(&self, ids: &[i32]) -> StoreResult<Vec<LabelRecord>>;
    async fn list_labels(&self) -> StoreResult<Vec<LabelRecord>>;
    async fn update_label(&self, label: &LabelRecord) -> StoreResult<LabelRecord>;
    /// Deletes the label and its task associations. Returns false if absent.
    async fn delete_label(&self, id: i32) -> StoreResult<bool>;

    async fn insert_task(&self, task: &NewTask) -> StoreResult<TaskRecord>;
    async fn find_task(&self, id: i32) -> StoreResult<Option<TaskRecord>>;
    async fn list_tasks(&self) -> StoreResult<Vec<TaskRecord>>;
    async fn update_task(&self, task: &TaskRecord) -> StoreResult<TaskRecord>;
    /// Deletes the task and its label associations. Returns false if absent.
    async fn delete_task(&self, id: i32) -> StoreResult<bool>;

    /// `(task_id, label)` pairs for every association of the given tasks.
    async fn labels_of_tasks(&self, task_ids: &[i32]) -> StoreResult<Vec<(i32, LabelRecord)>>;
    /// `(label_id, task)` pairs for every association of the given labels.
    async fn tasks_of_labels(&self, label_ids: &[i32]) -> StoreResult<Vec<(i32, TaskRecord)>>;
    /// Links are inserted once; an existing link is left alone.
    async fn attach_labels(&self, task_id: i32, label_ids: &[i32]) -> StoreResult<()>;
    async fn detach_labels(&self, task_id: i32, label_ids: &[i32]) -> StoreResult<()>;
}
