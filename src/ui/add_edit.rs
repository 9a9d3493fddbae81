//! Add/edit task form model.

use crate::error::{ModelError, ValidationError};
use crate::events::{AddEditResult, AddEditTaskEvent, EventChannel, EventSubscription};
use crate::store::TaskStore;
use crate::types::{NewTask, Task, validate_task_name};
use std::sync::Arc;
use tracing::debug;

/// Form state for creating a new task or editing an existing one.
pub struct AddEditTaskModel<S: TaskStore + ?Sized> {
    store: Arc<S>,
    task: Option<Task>,
    pub task_name: String,
    pub task_importance: bool,
    events: EventChannel<AddEditTaskEvent>,
}

impl<S: TaskStore + ?Sized> AddEditTaskModel<S> {
    /// Empty form for a new task.
    pub fn for_new_task(store: Arc<S>, event_capacity: usize) -> Self {
        Self {
            store,
            task: None,
            task_name: String::new(),
            task_importance: false,
            events: EventChannel::new(event_capacity),
        }
    }

    /// Form pre-filled from an existing task.
    pub fn for_task(store: Arc<S>, task: Task, event_capacity: usize) -> Self {
        Self {
            store,
            task_name: task.name.clone(),
            task_importance: task.important,
            task: Some(task),
            events: EventChannel::new(event_capacity),
        }
    }

    /// The task being edited, if any.
    pub fn task(&self) -> Option<&Task> {
        self.task.as_ref()
    }

    /// "Created ..." label for the edit screen.
    pub fn created_label(&self) -> Option<String> {
        self.task
            .as_ref()
            .map(|task| format!("Created {}", task.created_date_formatted()))
    }

    pub fn events(&self) -> Option<EventSubscription<AddEditTaskEvent>> {
        self.events.attach()
    }

    /// Validate and save the form.
    ///
    /// A blank name is reported as [`AddEditTaskEvent::ShowInvalidInputMessage`]
    /// and nothing is written. Store failures are returned to the caller.
    pub async fn on_save_click(&self) -> Result<(), ModelError> {
        let name = match validate_task_name(self.task_name.clone()) {
            Ok(name) => name,
            Err(err) => {
                debug!(error = %err, "Rejected task form");
                self.show_invalid_input_message(&err).await;
                return Ok(());
            }
        };

        let result = match &self.task {
            Some(task) => {
                let updated = task.with_details(name, self.task_importance);
                self.store.update(&updated).await?;
                AddEditResult::Updated
            }
            None => {
                self.store
                    .insert(NewTask {
                        name,
                        important: self.task_importance,
                        completed: false,
                    })
                    .await?;
                AddEditResult::Added
            }
        };

        self.events
            .send(AddEditTaskEvent::NavigateBackWithResult(result))
            .await;
        Ok(())
    }

    async fn show_invalid_input_message(&self, err: &ValidationError) {
        self.events
            .send(AddEditTaskEvent::ShowInvalidInputMessage(err.to_string()))
            .await;
    }
}
