use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};

use super::{EntityStore, StoreError, StoreResult};
use crate::models::{LabelRecord, NewTask, TaskCategory, TaskRecord};

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: i32,
    title: String,
    description: String,
    due_date: Option<NaiveDate>,
    date_created: DateTime<Utc>,
    category: String,
}

impl TryFrom<TaskRow> for TaskRecord {
    type Error = StoreError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let category = TaskCategory::from_str(&row.category).map_err(|_| {
            StoreError::Corrupt(format!(
                "task {} has unknown category {:?}",
                row.id, row.category
            ))
        })?;

        Ok(TaskRecord {
            id: row.id,
            title: row.title,
            description: row.description,
            due_date: row.due_date,
            date_created: row.date_created,
            category,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LabelRow {
    id: i32,
    name: String,
    color: String,
}

impl From<LabelRow> for LabelRecord {
    fn from(row: LabelRow) -> Self {
        LabelRecord {
            id: row.id,
            name: row.name,
            color: row.color,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TaskLabelRow {
    task_id: i32,
    id: i32,
    name: String,
    color: String,
}

#[derive(sqlx::FromRow)]
struct LabelTaskRow {
    label_id: i32,
    id: i32,
    title: String,
    description: String,
    due_date: Option<NaiveDate>,
    date_created: DateTime<Utc>,
    category: String,
}

fn tasks_from_rows(rows: Vec<TaskRow>) -> StoreResult<Vec<TaskRecord>> {
    rows.into_iter().map(TaskRecord::try_from).collect()
}

/// PostgreSQL-backed store. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects, then brings the schema up to date.
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("database migrations applied");

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl EntityStore for PgStore {
    fn kind(&self) -> &'static str {
        "postgres"
    }

    async fn insert_label(&self, name: &str, color: &str) -> StoreResult<LabelRecord> {
        let row = sqlx::query_as::<_, LabelRow>(
            r#"
            INSERT INTO labels (name, color)
            VALUES ($1, $2)
            RETURNING id, name, color
            "#,
        )
        .bind(name)
        .bind(color)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_label(&self, id: i32) -> StoreResult<Option<LabelRecord>> {
        let row = sqlx::query_as::<_, LabelRow>("SELECT id, name, color FROM labels WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn find_labels(&self, ids: &[i32]) -> StoreResult<Vec<LabelRecord>> {
        let rows = sqlx::query_as::<_, LabelRow>(
            "SELECT id, name, color FROM labels WHERE id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_labels(&self) -> StoreResult<Vec<LabelRecord>> {
        let rows = sqlx::query_as::<_, LabelRow>("SELECT id, name, color FROM labels ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_label(&self, label: &LabelRecord) -> StoreResult<LabelRecord> {
        let row = sqlx::query_as::<_, LabelRow>(
            r#"
            UPDATE labels
            SET name = $2, color = $3
            WHERE id = $1
            RETURNING id, name, color
            "#,
        )
        .bind(label.id)
        .bind(&label.name)
        .bind(&label.color)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Into::into)
            .ok_or_else(|| StoreError::Missing(format!("label {}", label.id)))
    }

    async fn delete_label(&self, id: i32) -> StoreResult<bool> {
        // task_labels rows go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM labels WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_task(&self, task: &NewTask) -> StoreResult<TaskRecord> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            INSERT INTO tasks (title, description, due_date, date_created, category)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, due_date, date_created, category
            "#,
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.due_date)
        .bind(task.date_created)
        .bind(task.category.to_string())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find_task(&self, id: i32) -> StoreResult<Option<TaskRecord>> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, title, description, due_date, date_created, category
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TaskRecord::try_from).transpose()
    }

    async fn list_tasks(&self) -> StoreResult<Vec<TaskRecord>> {
        let rows = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, title, description, due_date, date_created, category
            FROM tasks
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        tasks_from_rows(rows)
    }

    async fn update_task(&self, task: &TaskRecord) -> StoreResult<TaskRecord> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            UPDATE tasks
            SET
                title = $2,
                description = $3,
                due_date = $4,
                category = $5
            WHERE id = $1
            RETURNING id, title, description, due_date, date_created, category
            "#,
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.due_date)
        .bind(task.category.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.try_into(),
            None => Err(StoreError::Missing(format!("task {}", task.id))),
        }
    }

    async fn delete_task(&self, id: i32) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn labels_of_tasks(&self, task_ids: &[i32]) -> StoreResult<Vec<(i32, LabelRecord)>> {
        let rows = sqlx::query_as::<_, TaskLabelRow>(
            r#"
            SELECT tl.task_id, l.id, l.name, l.color
            FROM task_labels tl
            JOIN labels l ON l.id = tl.label_id
            WHERE tl.task_id = ANY($1)
            ORDER BY tl.task_id, l.id
            "#,
        )
        .bind(task_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                (
                    r.task_id,
                    LabelRecord {
                        id: r.id,
                        name: r.name,
                        color: r.color,
                    },
                )
            })
            .collect())
    }

    async fn tasks_of_labels(&self, label_ids: &[i32]) -> StoreResult<Vec<(i32, TaskRecord)>> {
        let rows = sqlx::query_as::<_, LabelTaskRow>(
            r#"
            SELECT tl.label_id, t.id, t.title, t.description, t.due_date, t.date_created, t.category
            FROM task_labels tl
            JOIN tasks t ON t.id = tl.task_id
            WHERE tl.label_id = ANY($1)
            ORDER BY tl.label_id, t.id
            "#,
        )
        .bind(label_ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                let task = TaskRecord::try_from(TaskRow {
                    id: r.id,
                    title: r.title,
                    description: r.description,
                    due_date: r.due_date,
                    date_created: r.date_created,
                    category: r.category,
                })?;
                Ok((r.label_id, task))
            })
            .collect()
    }

    async fn attach_labels(&self, task_id: i32, label_ids: &[i32]) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO task_labels (task_id, label_id)
            SELECT $1, label_id FROM UNNEST($2::int4[]) AS label_id
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(task_id)
        .bind(label_ids)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn detach_labels(&self, task_id: i32, label_ids: &[i32]) -> StoreResult<()> {
        sqlx::query("DELETE FROM task_labels WHERE task_id = $1 AND label_id = ANY($2)")
            .bind(task_id)
            .bind(label_ids)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(category: &str) -> TaskRow {
        TaskRow {
            id: 7,
            title: "Write docs".into(),
            description: "API reference".into(),
            due_date: NaiveDate::from_ymd_opt(2025, 7, 10),
            date_created: Utc::now(),
            category: category.into(),
        }
    }

    #[test]
    fn stored_category_text_maps_to_enum() {
        let task = TaskRecord::try_from(row("IN_PROGRESS")).unwrap();
        assert_eq!(task.id, 7);
        assert_eq!(task.category, TaskCategory::InProgress);
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2025, 7, 10));
    }

    #[test]
    fn unknown_stored_category_is_corrupt() {
        match TaskRecord::try_from(row("ARCHIVED")) {
            Err(StoreError::Corrupt(msg)) => {
                assert_eq!(msg, "task 7 has unknown category \"ARCHIVED\"");
            }
            other => panic!("expected corrupt row, got {other:?}"),
        }

        let rows = vec![row("TODO"), row("done")];
        assert!(matches!(tasks_from_rows(rows), Err(StoreError::Corrupt(_))));
    }

    // Runs only when TEST_DATABASE_URL points at a disposable database.
    async fn live_store() -> Option<PgStore> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        Some(PgStore::connect(&url, 2).await.unwrap())
    }

    #[tokio::test]
    async fn attach_detach_round_trip_against_postgres() {
        let Some(store) = live_store().await else {
            return;
        };

        let task = store
            .insert_task(&NewTask {
                title: "Set up CI".into(),
                description: "GitHub Actions".into(),
                due_date: None,
                date_created: Utc::now(),
                category: TaskCategory::Todo,
            })
            .await
            .unwrap();
        let a = store.insert_label("Ops", "#112233").await.unwrap();
        let b = store.insert_label("Infra", "#abc").await.unwrap();

        store.attach_labels(task.id, &[a.id, b.id]).await.unwrap();
        store.attach_labels(task.id, &[a.id]).await.unwrap();

        let labels = store.labels_of_tasks(&[task.id]).await.unwrap();
        let ids: Vec<i32> = labels.iter().map(|(_, l)| l.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);

        let tasks = store.tasks_of_labels(&[a.id]).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].1.category, TaskCategory::Todo);

        store.detach_labels(task.id, &[a.id]).await.unwrap();
        let labels = store.labels_of_tasks(&[task.id]).await.unwrap();
        assert_eq!(labels.len(), 1);

        assert_eq!(store.find_labels(&[a.id, b.id]).await.unwrap().len(), 2);

        assert!(store.delete_task(task.id).await.unwrap());
        assert!(store.labels_of_tasks(&[task.id]).await.unwrap().is_empty());
        assert!(store.delete_label(a.id).await.unwrap());
        assert!(store.delete_label(b.id).await.unwrap());
    }
}
