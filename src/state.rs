use std::sync::Arc;

use crate::services::{LabelService, TaskService};
use crate::store::EntityStore;

#[derive(Clone)]
pub struct AppState {
    pub tasks: TaskService,
    pub labels: LabelService,
    pub store_kind: &'static str,
}

impl AppState {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            store_kind: store.kind(),
            tasks: TaskService::new(store.clone()),
            labels: LabelService::new(store),
        }
    }
}
