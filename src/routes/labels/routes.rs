use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;

use super::normalize_color;
use crate::error::ServiceError;
use crate::routes::extract::{JsonBody, PathParam};
use crate::models::{CreateLabel, LabelPatch};
use crate::state::AppState;
use crate::validation::{self, CREATE_LABEL, UPDATE_LABEL};

/// Create a new label
pub async fn create(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> Result<impl IntoResponse, ServiceError> {
    let input: CreateLabel = validation::parse(CREATE_LABEL, normalize_color(body))?;
    let label = state.labels.create_label(input).await?;

    Ok((StatusCode::CREATED, Json(label)))
}

/// List all labels with the tasks they are attached to
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let labels = state.labels.get_all_labels().await?;
    Ok(Json(labels))
}

pub async fn delete(
    State(state): State<AppState>,
    PathParam(label_id): PathParam<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let ack = state.labels.delete_label(label_id).await?;
    Ok(Json(ack))
}

/// Update a label's name and/or color
pub async fn update(
    State(state): State<AppState>,
    PathParam(label_id): PathParam<i32>,
    JsonBody(body): JsonBody<Value>,
) -> Result<impl IntoResponse, ServiceError> {
    let patch: LabelPatch = validation::parse(UPDATE_LABEL, normalize_color(body))?;
    let label = state.labels.update_label(label_id, patch).await?;

    Ok(Json(label))
}
