use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

mod extract;
mod health;
mod labels;
mod tasks;

pub use health::health;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    let label_router = Router::new()
        .route("/", get(labels::routes::list))
        .route("/label", post(labels::routes::create))
        .route("/{label_id}", delete(labels::routes::delete))
        .route("/{label_id}/edit", patch(labels::routes::update));

    let task_router = Router::new()
        .route("/", post(tasks::routes::create).get(tasks::routes::list))
        .route("/add_labels", post(tasks::routes::add_labels))
        .route("/remove_labels", post(tasks::routes::remove_labels))
        .route(
            "/{task_id}",
            get(tasks::routes::get).delete(tasks::routes::delete),
        )
        .route("/{task_id}/edit", patch(tasks::routes::update))
        .route("/{task_id}/category", patch(tasks::routes::change_category));

    Router::new()
        .route("/health", get(health))
        .nest("/labels", label_router)
        .nest("/tasks", task_router)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
