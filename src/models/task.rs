use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{Display, EnumString};

use super::label::LabelRecord;

/// Workflow state a task sits in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskCategory {
    Draft,
    Todo,
    InProgress,
    Completed,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 4] = [
        TaskCategory::Draft,
        TaskCategory::Todo,
        TaskCategory::InProgress,
        TaskCategory::Completed,
    ];
}

/// A task row as held by the store, without its labels.
///
/// Also used as the task summary embedded in a label's `tasks` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub date_created: DateTime<Utc>,
    pub category: TaskCategory,
}

/// A task together with its materialized label set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub date_created: DateTime<Utc>,
    pub category: TaskCategory,
    pub labels: Vec<LabelRecord>,
}

impl Task {
    pub fn from_record(record: TaskRecord, labels: Vec<LabelRecord>) -> Self {
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            due_date: record.due_date,
            date_created: record.date_created,
            category: record.category,
            labels,
        }
    }

    pub fn label_ids(&self) -> Vec<i32> {
        self.labels.iter().map(|l| l.id).collect()
    }
}

/// Parses `YYYY-MM-DD`, or an RFC 3339 timestamp whose date part is kept.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.date_naive())
    })
}

fn deserialize_due_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(raw) => parse_date(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date {raw:?}"))),
    }
}

/// Fields of a task about to be inserted. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub date_created: DateTime<Utc>,
    pub category: TaskCategory,
}

/// Input of `TaskService::create_task`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    pub title: String,
    pub description: String,
    #[serde(default, deserialize_with = "deserialize_due_date")]
    pub due_date: Option<NaiveDate>,
    pub category: TaskCategory,
}

/// Partial update of a task; only the supplied fields are applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_due_date")]
    pub due_date: Option<NaiveDate>,
    pub category: Option<TaskCategory>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.category.is_none()
    }

    pub fn apply_to(self, record: &mut TaskRecord) {
        if let Some(title) = self.title {
            record.title = title;
        }
        if let Some(description) = self.description {
            record.description = description;
        }
        if let Some(due_date) = self.due_date {
            record.due_date = Some(due_date);
        }
        if let Some(category) = self.category {
            record.category = category;
        }
    }
}
