use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;

use super::{parse_category, UpdateLabelsRequest};
use crate::error::ServiceError;
use crate::routes::extract::{JsonBody, PathParam};
use crate::models::{CreateTask, TaskPatch};
use crate::state::AppState;
use crate::validation::{self, CREATE_TASK, UPDATE_LABELS, UPDATE_TASK};

/// Create a new task
pub async fn create(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> Result<impl IntoResponse, ServiceError> {
    let input: CreateTask = validation::parse(CREATE_TASK, body)?;
    let task = state.tasks.create_task(input).await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// List all tasks with their labels
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let tasks = state.tasks.get_all_tasks().await?;
    Ok(Json(tasks))
}

pub async fn get(
    State(state): State<AppState>,
    PathParam(task_id): PathParam<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let task = state.tasks.get_task_by_id(task_id).await?;
    Ok(Json(task))
}

/// Partially update a task
pub async fn update(
    State(state): State<AppState>,
    PathParam(task_id): PathParam<i32>,
    JsonBody(body): JsonBody<Value>,
) -> Result<impl IntoResponse, ServiceError> {
    let patch: TaskPatch = validation::parse(UPDATE_TASK, body)?;
    let task = state.tasks.update_task(task_id, patch).await?;

    Ok(Json(task))
}

pub async fn delete(
    State(state): State<AppState>,
    PathParam(task_id): PathParam<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let ack = state.tasks.delete_task(task_id).await?;
    Ok(Json(ack))
}

/// Move a task to another category
pub async fn change_category(
    State(state): State<AppState>,
    PathParam(task_id): PathParam<i32>,
    body: Result<JsonBody<Value>, ServiceError>,
) -> Result<impl IntoResponse, ServiceError> {
    // A missing or unreadable body is just a missing categoryId.
    let body = body.map(|JsonBody(body)| body).unwrap_or_default();
    let category = parse_category(body)?;
    let task = state.tasks.update_task_category(task_id, category).await?;

    Ok(Json(task))
}

pub async fn add_labels(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> Result<impl IntoResponse, ServiceError> {
    let req: UpdateLabelsRequest = validation::parse(UPDATE_LABELS, body)?;
    let task = state.tasks.add_task_labels(req.task_id, &req.label_ids).await?;

    Ok(Json(task))
}

pub async fn remove_labels(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> Result<impl IntoResponse, ServiceError> {
    let req: UpdateLabelsRequest = validation::parse(UPDATE_LABELS, body)?;
    let task = state
        .tasks
        .remove_task_labels(req.task_id, &req.label_ids)
        .await?;

    Ok(Json(task))
}
