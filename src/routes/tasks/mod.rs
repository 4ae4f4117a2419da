pub mod routes;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ServiceError, ServiceResult};
use crate::models::TaskCategory;
use crate::validation::{self, Rule, Schema};

// REQUESTS

/// Body of `/tasks/add_labels` and `/tasks/remove_labels`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLabelsRequest {
    pub task_id: i32,
    pub label_ids: Vec<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeCategoryRequest {
    pub category_id: TaskCategory,
}

const CHANGE_CATEGORY: Schema = &[("categoryId", &[Rule::Required, Rule::Category])];

// HELPERS

/// Any problem with `categoryId` is reported the same way, whether it is
/// missing or names no known category.
pub fn parse_category(body: Value) -> ServiceResult<TaskCategory> {
    validation::parse::<ChangeCategoryRequest>(CHANGE_CATEGORY, body)
        .map(|req| req.category_id)
        .map_err(|_| ServiceError::validation("New category does not exist"))
}
