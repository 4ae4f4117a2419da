use serde::{Deserialize, Serialize};

use super::task::TaskRecord;

/// A label row as held by the store. Embedded as-is in a task's `labels`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRecord {
    pub id: i32,
    pub name: String,
    pub color: String,
}

/// A label with the tasks it is attached to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    pub id: i32,
    pub name: String,
    pub color: String,
    pub tasks: Vec<TaskRecord>,
}

impl Label {
    pub fn from_record(record: LabelRecord, tasks: Vec<TaskRecord>) -> Self {
        Self {
            id: record.id,
            name: record.name,
            color: record.color,
            tasks,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLabel {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelPatch {
    pub name: Option<String>,
    pub color: Option<String>,
}

impl LabelPatch {
    pub fn apply_to(self, record: &mut LabelRecord) {
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(color) = self.color {
            record.color = color;
        }
    }
}
