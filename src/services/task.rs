use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::Utc;

use super::label::DeleteResult;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{CreateTask, LabelRecord, NewTask, Task, TaskCategory, TaskPatch, TaskRecord};
use crate::store::EntityStore;

/// Request order, first occurrence wins.
fn dedup(ids: &[i32]) -> Vec<i32> {
    let mut seen = BTreeSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

fn join_ids(ids: &[i32]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn task_missing(id: i32) -> ServiceError {
    ServiceError::not_found(format!("Task with ID {id} does not exist in database"))
}

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn EntityStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    async fn materialize(&self, records: Vec<TaskRecord>) -> ServiceResult<Vec<Task>> {
        let ids: Vec<i32> = records.iter().map(|t| t.id).collect();
        let mut labels_by_task: HashMap<i32, Vec<LabelRecord>> = HashMap::new();
        for (task_id, label) in self.store.labels_of_tasks(&ids).await? {
            labels_by_task.entry(task_id).or_default().push(label);
        }

        Ok(records
            .into_iter()
            .map(|record| {
                let labels = labels_by_task.remove(&record.id).unwrap_or_default();
                Task::from_record(record, labels)
            })
            .collect())
    }

    async fn materialize_one(&self, record: TaskRecord) -> ServiceResult<Task> {
        let id = record.id;
        self.materialize(vec![record])
            .await?
            .pop()
            .ok_or_else(|| task_missing(id))
    }

    pub async fn create_task(&self, input: CreateTask) -> ServiceResult<Task> {
        if input.title.trim().is_empty() {
            return Err(ServiceError::validation("The 'title' field cannot be null"));
        }

        let record = self
            .store
            .insert_task(&NewTask {
                title: input.title,
                description: input.description,
                due_date: input.due_date,
                date_created: Utc::now(),
                category: input.category,
            })
            .await?;
        tracing::debug!(task_id = record.id, category = %record.category, "task created");

        Ok(Task::from_record(record, Vec::new()))
    }

    /// Merges `patch` into the task. Nothing is written if the merge is rejected.
    pub async fn update_task(&self, id: i32, patch: TaskPatch) -> ServiceResult<Task> {
        let mut record = self
            .store
            .find_task(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("No tasks exist with id {id}")))?;

        if patch.is_empty() {
            return Err(ServiceError::validation(
                "At least one property (title, description, or dueDate) must be provided",
            ));
        }

        patch.apply_to(&mut record);
        if record.title.trim().is_empty() {
            return Err(ServiceError::validation("The 'title' field cannot be null"));
        }

        let saved = self.store.update_task(&record).await?;
        tracing::debug!(task_id = id, "task updated");

        self.materialize_one(saved).await
    }

    pub async fn get_all_tasks(&self) -> ServiceResult<Vec<Task>> {
        let records = self.store.list_tasks().await?;
        self.materialize(records).await
    }

    pub async fn get_task_by_id(&self, id: i32) -> ServiceResult<Task> {
        let record = self
            .store
            .find_task(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("No task exists with id {id}")))?;

        self.materialize_one(record).await
    }

    pub async fn delete_task(&self, id: i32) -> ServiceResult<DeleteResult> {
        if !self.store.delete_task(id).await? {
            return Err(ServiceError::not_found(format!(
                "Task with id {id} does not exist"
            )));
        }
        tracing::debug!(task_id = id, "task deleted");

        Ok(DeleteResult {
            success: true,
            message: format!("Task with id {id} has been deleted successfully"),
        })
    }

    pub async fn update_task_category(
        &self,
        id: i32,
        category: TaskCategory,
    ) -> ServiceResult<Task> {
        let mut record = self
            .store
            .find_task(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("No tasks exists with id {id}")))?;

        record.category = category;
        let saved = self.store.update_task(&record).await?;
        tracing::debug!(task_id = id, %category, "task moved");

        self.materialize_one(saved).await
    }

    /// Attaches labels to a task.
    ///
    /// Every id must name an existing label or the call fails without
    /// touching the task. Labels already on the task are skipped.
    pub async fn add_task_labels(&self, task_id: i32, label_ids: &[i32]) -> ServiceResult<Task> {
        let task = self.get_task_by_id(task_id).await.map_err(|e| match e {
            ServiceError::NotFound(_) => task_missing(task_id),
            other => other,
        })?;

        let requested = dedup(label_ids);
        let found = self.store.find_labels(&requested).await?;
        let found_ids: BTreeSet<i32> = found.iter().map(|l| l.id).collect();

        let missing: Vec<i32> = requested
            .iter()
            .copied()
            .filter(|id| !found_ids.contains(id))
            .collect();
        match missing.as_slice() {
            [] => {}
            [one] => {
                return Err(ServiceError::validation(format!(
                    "Label with ID {one} does not exist in database"
                )));
            }
            many => {
                return Err(ServiceError::validation(format!(
                    "Labels with IDs {} do not exist in database",
                    join_ids(many)
                )));
            }
        }

        let current: BTreeSet<i32> = task.label_ids().into_iter().collect();
        let new_ids: Vec<i32> = requested
            .into_iter()
            .filter(|id| !current.contains(id))
            .collect();

        if new_ids.is_empty() {
            return Ok(task);
        }

        self.store.attach_labels(task_id, &new_ids).await?;
        tracing::debug!(task_id, labels = ?new_ids, "labels attached");

        self.get_task_by_id(task_id).await
    }

    /// Detaches labels from a task. Every id must currently be attached.
    pub async fn remove_task_labels(
        &self,
        task_id: i32,
        label_ids: &[i32],
    ) -> ServiceResult<Task> {
        let task = self.get_task_by_id(task_id).await.map_err(|e| match e {
            ServiceError::NotFound(_) => task_missing(task_id),
            other => other,
        })?;

        let requested = dedup(label_ids);
        let current: BTreeSet<i32> = task.label_ids().into_iter().collect();
        let unassigned: Vec<i32> = requested
            .iter()
            .copied()
            .filter(|id| !current.contains(id))
            .collect();
        match unassigned.as_slice() {
            [] => {}
            [one] => {
                return Err(ServiceError::validation(format!(
                    "Label ID {one} is not assigned to this task"
                )));
            }
            many => {
                return Err(ServiceError::validation(format!(
                    "Label IDs {} are not assigned to this task",
                    join_ids(many)
                )));
            }
        }

        self.store.detach_labels(task_id, &requested).await?;
        tracing::debug!(task_id, labels = ?requested, "labels detached");

        self.get_task_by_id(task_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateLabel;
    use crate::services::LabelService;
    use crate::store::MemoryStore;
    use chrono::NaiveDate;

    struct Fixture {
        tasks: TaskService,
        labels: LabelService,
    }

    fn fixture() -> Fixture {
        let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new());
        Fixture {
            tasks: TaskService::new(store.clone()),
            labels: LabelService::new(store),
        }
    }

    fn new_task(title: &str) -> CreateTask {
        CreateTask {
            title: title.to_string(),
            description: "B".to_string(),
            due_date: None,
            category: TaskCategory::Todo,
        }
    }

    impl Fixture {
        async fn task(&self, title: &str) -> Task {
            self.tasks.create_task(new_task(title)).await.unwrap()
        }

        async fn label(&self, name: &str) -> i32 {
            self.labels
                .create_label(CreateLabel {
                    name: name.to_string(),
                    color: "#112233".to_string(),
                })
                .await
                .unwrap()
                .id
        }
    }

    fn validation_message<T: std::fmt::Debug>(result: ServiceResult<T>) -> String {
        match result {
            Err(ServiceError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    fn not_found_message<T: std::fmt::Debug>(result: ServiceResult<T>) -> String {
        match result {
            Err(ServiceError::NotFound(msg)) => msg,
            other => panic!("expected not-found error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_requires_title() {
        let f = fixture();
        let msg = validation_message(f.tasks.create_task(new_task("")).await);
        assert_eq!(msg, "The 'title' field cannot be null");
        assert!(f.tasks.get_all_tasks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_sets_creation_date_and_empty_labels() {
        let f = fixture();
        let before = Utc::now();
        let task = f.task("A").await;
        assert_eq!(task.id, 1);
        assert!(task.date_created >= before);
        assert!(task.labels.is_empty());
        assert_eq!(task.category, TaskCategory::Todo);
    }

    #[tokio::test]
    async fn update_merges_patch() {
        let f = fixture();
        let task = f.task("A").await;
        let due = NaiveDate::from_ymd_opt(2025, 11, 7).unwrap();

        let updated = f
            .tasks
            .update_task(
                task.id,
                TaskPatch {
                    due_date: Some(due),
                    category: Some(TaskCategory::InProgress),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "A");
        assert_eq!(updated.description, "B");
        assert_eq!(updated.due_date, Some(due));
        assert_eq!(updated.category, TaskCategory::InProgress);
        assert_eq!(updated.date_created, task.date_created);
    }

    #[tokio::test]
    async fn update_rejections() {
        let f = fixture();
        let task = f.task("A").await;

        let msg = not_found_message(f.tasks.update_task(7, TaskPatch::default()).await);
        assert_eq!(msg, "No tasks exist with id 7");

        let msg = validation_message(f.tasks.update_task(task.id, TaskPatch::default()).await);
        assert_eq!(
            msg,
            "At least one property (title, description, or dueDate) must be provided"
        );

        let blank = TaskPatch {
            title: Some("   ".to_string()),
            description: Some("changed".to_string()),
            ..Default::default()
        };
        let msg = validation_message(f.tasks.update_task(task.id, blank).await);
        assert_eq!(msg, "The 'title' field cannot be null");

        let stored = f.tasks.get_task_by_id(task.id).await.unwrap();
        assert_eq!(stored.title, "A");
        assert_eq!(stored.description, "B");
    }

    #[tokio::test]
    async fn get_and_delete_unknown_task() {
        let f = fixture();
        let msg = not_found_message(f.tasks.get_task_by_id(3).await);
        assert_eq!(msg, "No task exists with id 3");
        let msg = not_found_message(f.tasks.delete_task(3).await);
        assert_eq!(msg, "Task with id 3 does not exist");
    }

    #[tokio::test]
    async fn delete_task_keeps_labels() {
        let f = fixture();
        let task = f.task("A").await;
        let label = f.label("X").await;
        f.tasks.add_task_labels(task.id, &[label]).await.unwrap();

        let ack = f.tasks.delete_task(task.id).await.unwrap();
        assert_eq!(ack.message, "Task with id 1 has been deleted successfully");

        let labels = f.labels.get_all_labels().await.unwrap();
        assert_eq!(labels.len(), 1);
        assert!(labels[0].tasks.is_empty());
    }

    #[tokio::test]
    async fn category_change() {
        let f = fixture();
        let task = f.task("A").await;

        let moved = f
            .tasks
            .update_task_category(task.id, TaskCategory::Completed)
            .await
            .unwrap();
        assert_eq!(moved.category, TaskCategory::Completed);

        let msg = not_found_message(f.tasks.update_task_category(999, TaskCategory::Todo).await);
        assert_eq!(msg, "No tasks exists with id 999");
    }

    #[tokio::test]
    async fn add_is_idempotent() {
        let f = fixture();
        let task = f.task("A").await;
        let l1 = f.label("X").await;

        let once = f.tasks.add_task_labels(task.id, &[l1, l1]).await.unwrap();
        assert_eq!(once.label_ids(), vec![l1]);

        let again = f.tasks.add_task_labels(task.id, &[l1]).await.unwrap();
        assert_eq!(again.label_ids(), vec![l1]);
    }

    #[tokio::test]
    async fn add_with_one_missing_label_changes_nothing() {
        let f = fixture();
        let task = f.task("A").await;
        let l1 = f.label("X").await;

        let msg = validation_message(f.tasks.add_task_labels(task.id, &[l1, 9999]).await);
        assert_eq!(msg, "Label with ID 9999 does not exist in database");

        let task = f.tasks.get_task_by_id(task.id).await.unwrap();
        assert!(task.labels.is_empty());
    }

    #[tokio::test]
    async fn add_with_several_missing_labels_names_them_all() {
        let f = fixture();
        let task = f.task("A").await;
        let l1 = f.label("X").await;

        let msg = validation_message(
            f.tasks
                .add_task_labels(task.id, &[500, l1, 9999, 500])
                .await,
        );
        assert_eq!(msg, "Labels with IDs 500, 9999 do not exist in database");
    }

    #[tokio::test]
    async fn add_to_unknown_task() {
        let f = fixture();
        let l1 = f.label("X").await;
        let msg = not_found_message(f.tasks.add_task_labels(12, &[l1]).await);
        assert_eq!(msg, "Task with ID 12 does not exist in database");
        let msg = not_found_message(f.tasks.remove_task_labels(12, &[l1]).await);
        assert_eq!(msg, "Task with ID 12 does not exist in database");
    }

    #[tokio::test]
    async fn remove_rejects_unattached_labels() {
        let f = fixture();
        let task = f.task("A").await;
        let l1 = f.label("X").await;
        let l2 = f.label("Y").await;
        let l3 = f.label("Z").await;
        f.tasks.add_task_labels(task.id, &[l1]).await.unwrap();

        let msg = validation_message(f.tasks.remove_task_labels(task.id, &[l2]).await);
        assert_eq!(msg, format!("Label ID {l2} is not assigned to this task"));

        let msg = validation_message(f.tasks.remove_task_labels(task.id, &[l1, l2, l3]).await);
        assert_eq!(
            msg,
            format!("Label IDs {l2}, {l3} are not assigned to this task")
        );

        let task = f.tasks.get_task_by_id(task.id).await.unwrap();
        assert_eq!(task.label_ids(), vec![l1]);
    }

    #[tokio::test]
    async fn end_to_end_attach_and_detach() {
        let f = fixture();
        let task = f
            .tasks
            .create_task(CreateTask {
                title: "A".to_string(),
                description: "B".to_string(),
                due_date: None,
                category: TaskCategory::Todo,
            })
            .await
            .unwrap();
        assert_eq!(task.id, 1);

        let label = f
            .labels
            .create_label(CreateLabel {
                name: "X".to_string(),
                color: "#112233".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(label.id, 1);

        let with = f.tasks.add_task_labels(1, &[1]).await.unwrap();
        assert_eq!(
            with.labels,
            vec![LabelRecord {
                id: 1,
                name: "X".to_string(),
                color: "#112233".to_string(),
            }]
        );

        let without = f.tasks.remove_task_labels(1, &[1]).await.unwrap();
        assert!(without.labels.is_empty());
    }

    #[tokio::test]
    async fn listing_materializes_labels_per_task() {
        let f = fixture();
        let a = f.task("A").await;
        let b = f.task("B").await;
        let x = f.label("X").await;
        let y = f.label("Y").await;
        f.tasks.add_task_labels(a.id, &[x, y]).await.unwrap();
        f.tasks.add_task_labels(b.id, &[y]).await.unwrap();

        let all = f.tasks.get_all_tasks().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].label_ids(), vec![x, y]);
        assert_eq!(all[1].label_ids(), vec![y]);
    }
}
