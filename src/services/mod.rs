pub mod label;
pub mod task;

pub use label::{DeleteResult, LabelService};
pub use task::TaskService;
