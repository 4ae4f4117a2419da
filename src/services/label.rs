use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::color::is_hex_color;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{CreateLabel, Label, LabelPatch, LabelRecord, TaskRecord};
use crate::store::EntityStore;

/// Acknowledgement body returned by the delete endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteResult {
    pub success: bool,
    pub message: String,
}

#[derive(Clone)]
pub struct LabelService {
    store: Arc<dyn EntityStore>,
}

impl LabelService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    async fn materialize(&self, records: Vec<LabelRecord>) -> ServiceResult<Vec<Label>> {
        let ids: Vec<i32> = records.iter().map(|l| l.id).collect();
        let mut tasks_by_label: HashMap<i32, Vec<TaskRecord>> = HashMap::new();
        for (label_id, task) in self.store.tasks_of_labels(&ids).await? {
            tasks_by_label.entry(label_id).or_default().push(task);
        }

        Ok(records
            .into_iter()
            .map(|record| {
                let tasks = tasks_by_label.remove(&record.id).unwrap_or_default();
                Label::from_record(record, tasks)
            })
            .collect())
    }

    async fn find_record(&self, id: i32) -> ServiceResult<LabelRecord> {
        self.store
            .find_label(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Label with ID {id} does not exist")))
    }

    pub async fn create_label(&self, input: CreateLabel) -> ServiceResult<Label> {
        if input.name.trim().is_empty() {
            return Err(ServiceError::validation("The 'name' field cannot be null"));
        }
        if input.color.is_empty() {
            return Err(ServiceError::validation("The 'color' field cannot be null"));
        }
        if !is_hex_color(&input.color) {
            return Err(ServiceError::validation(
                "The 'color' field must be a valid hex color",
            ));
        }

        let record = self.store.insert_label(&input.name, &input.color).await?;
        tracing::debug!(label_id = record.id, name = %record.name, "label created");

        Ok(Label::from_record(record, Vec::new()))
    }

    pub async fn get_all_labels(&self) -> ServiceResult<Vec<Label>> {
        let records = self.store.list_labels().await?;
        self.materialize(records).await
    }

    pub async fn get_label_by_id(&self, id: i32) -> ServiceResult<Label> {
        let record = self.find_record(id).await?;
        let mut labels = self.materialize(vec![record]).await?;
        labels
            .pop()
            .ok_or_else(|| ServiceError::not_found(format!("Label with ID {id} does not exist")))
    }

    /// Removes the label; tasks that carried it lose it but are kept.
    pub async fn delete_label(&self, id: i32) -> ServiceResult<DeleteResult> {
        if !self.store.delete_label(id).await? {
            return Err(ServiceError::not_found(format!(
                "Label with ID {id} does not exist"
            )));
        }
        tracing::debug!(label_id = id, "label deleted");

        Ok(DeleteResult {
            success: true,
            message: format!("Label with ID {id} deleted successfully"),
        })
    }

    pub async fn update_label(&self, id: i32, patch: LabelPatch) -> ServiceResult<Label> {
        let mut record = self.find_record(id).await?;

        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(ServiceError::validation("The 'name' field cannot be null"));
            }
        }
        if let Some(color) = &patch.color {
            if !is_hex_color(color) {
                return Err(ServiceError::validation(
                    "The 'color' field must be a valid hex color",
                ));
            }
        }

        if patch.name.is_none() && patch.color.is_none() {
            return self.get_label_by_id(id).await;
        }

        patch.apply_to(&mut record);
        let saved = self.store.update_label(&record).await?;
        tracing::debug!(label_id = id, "label updated");

        let mut labels = self.materialize(vec![saved]).await?;
        labels
            .pop()
            .ok_or_else(|| ServiceError::not_found(format!("Label with ID {id} does not exist")))
    }
}
