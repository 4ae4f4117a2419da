pub mod label;
pub mod task;

pub use label::{CreateLabel, Label, LabelPatch, LabelRecord};
pub use task::{CreateTask, NewTask, Task, TaskCategory, TaskPatch, TaskRecord};
