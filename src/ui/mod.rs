//! Screen models: the glue between user intents, the stores and the UI events.

pub mod add_edit;
pub mod delete_completed;
pub mod tasks;

pub use add_edit::AddEditTaskModel;
pub use delete_completed::DeleteAllCompletedModel;
pub use tasks::TasksModel;
