use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{EntityStore, StoreError, StoreResult};
use crate::models::{LabelRecord, NewTask, TaskRecord};

#[derive(Default)]
struct Tables {
    tasks: BTreeMap<i32, TaskRecord>,
    labels: BTreeMap<i32, LabelRecord>,
    // (task_id, label_id)
    links: BTreeSet<(i32, i32)>,
    next_task_id: i32,
    next_label_id: i32,
}

impl Tables {
    fn next_task_id(&mut self) -> i32 {
        self.next_task_id += 1;
        self.next_task_id
    }

    fn next_label_id(&mut self) -> i32 {
        self.next_label_id += 1;
        self.next_label_id
    }
}

/// Process-local store. Ids start at 1 and are never reused.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn insert_label(&self, name: &str, color: &str) -> StoreResult<LabelRecord> {
        let mut tables = self.tables.write().await;
        let label = LabelRecord {
            id: tables.next_label_id(),
            name: name.to_string(),
            color: color.to_string(),
        };
        tables.labels.insert(label.id, label.clone());
        Ok(label)
    }

    async fn find_label(&self, id: i32) -> StoreResult<Option<LabelRecord>> {
        Ok(self.tables.read().await.labels.get(&id).cloned())
    }

    async fn find_labels(&self, ids: &[i32]) -> StoreResult<Vec<LabelRecord>> {
        let tables = self.tables.read().await;
        let wanted: BTreeSet<i32> = ids.iter().copied().collect();
        Ok(wanted
            .into_iter()
            .filter_map(|id| tables.labels.get(&id).cloned())
            .collect())
    }

    async fn list_labels(&self) -> StoreResult<Vec<LabelRecord>> {
        Ok(self.tables.read().await.labels.values().cloned().collect())
    }

    async fn update_label(&self, label: &LabelRecord) -> StoreResult<LabelRecord> {
        let mut tables = self.tables.write().await;
        match tables.labels.get_mut(&label.id) {
            Some(slot) => {
                *slot = label.clone();
                Ok(label.clone())
            }
            None => Err(StoreError::Missing(format!("label {}", label.id))),
        }
    }

    async fn delete_label(&self, id: i32) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.labels.remove(&id).is_none() {
            return Ok(false);
        }
        tables.links.retain(|&(_, label_id)| label_id != id);
        Ok(true)
    }

    async fn insert_task(&self, task: &NewTask) -> StoreResult<TaskRecord> {
        let mut tables = self.tables.write().await;
        let record = TaskRecord {
            id: tables.next_task_id(),
            title: task.title.clone(),
            description: task.description.clone(),
            due_date: task.due_date,
            date_created: task.date_created,
            category: task.category,
        };
        tables.tasks.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_task(&self, id: i32) -> StoreResult<Option<TaskRecord>> {
        Ok(self.tables.read().await.tasks.get(&id).cloned())
    }

    async fn list_tasks(&self) -> StoreResult<Vec<TaskRecord>> {
        Ok(self.tables.read().await.tasks.values().cloned().collect())
    }

    async fn update_task(&self, task: &TaskRecord) -> StoreResult<TaskRecord> {
        let mut tables = self.tables.write().await;
        match tables.tasks.get_mut(&task.id) {
            Some(slot) => {
                // date_created is immutable
                let date_created = slot.date_created;
                *slot = TaskRecord {
                    date_created,
                    ..task.clone()
                };
                Ok(slot.clone())
            }
            None => Err(StoreError::Missing(format!("task {}", task.id))),
        }
    }

    async fn delete_task(&self, id: i32) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.tasks.remove(&id).is_none() {
            return Ok(false);
        }
        tables.links.retain(|&(task_id, _)| task_id != id);
        Ok(true)
    }

    async fn labels_of_tasks(&self, task_ids: &[i32]) -> StoreResult<Vec<(i32, LabelRecord)>> {
        let tables = self.tables.read().await;
        let wanted: BTreeSet<i32> = task_ids.iter().copied().collect();
        Ok(tables
            .links
            .iter()
            .filter(|(task_id, _)| wanted.contains(task_id))
            .filter_map(|(task_id, label_id)| {
                tables
                    .labels
                    .get(label_id)
                    .map(|label| (*task_id, label.clone()))
            })
            .collect())
    }

    async fn tasks_of_labels(&self, label_ids: &[i32]) -> StoreResult<Vec<(i32, TaskRecord)>> {
        let tables = self.tables.read().await;
        let wanted: BTreeSet<i32> = label_ids.iter().copied().collect();
        Ok(tables
            .links
            .iter()
            .filter(|(_, label_id)| wanted.contains(label_id))
            .filter_map(|(task_id, label_id)| {
                tables
                    .tasks
                    .get(task_id)
                    .map(|task| (*label_id, task.clone()))
            })
            .collect())
    }

    async fn attach_labels(&self, task_id: i32, label_ids: &[i32]) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.tasks.contains_key(&task_id) {
            return Err(StoreError::Missing(format!("task {task_id}")));
        }
        for &label_id in label_ids {
            if !tables.labels.contains_key(&label_id) {
                return Err(StoreError::Missing(format!("label {label_id}")));
            }
        }
        tables
            .links
            .extend(label_ids.iter().map(|&label_id| (task_id, label_id)));
        Ok(())
    }

    async fn detach_labels(&self, task_id: i32, label_ids: &[i32]) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        for &label_id in label_ids {
            tables.links.remove(&(task_id, label_id));
        }
        Ok(())
    }
}
