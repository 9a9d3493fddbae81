//! Task list screen model.

use crate::engine::{VisibleTasks, observe_visible_tasks};
use crate::error::ModelError;
use crate::events::{AddEditResult, EventChannel, EventSubscription, TasksEvent};
use crate::preferences::PreferenceStore;
use crate::query::TaskQuery;
use crate::store::TaskStore;
use crate::types::{FilterPreferences, NewTask, SortOrder, Task};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// State and intents of the task list screen.
///
/// The search text is transient and lives only as long as the model; sort
/// order and hide-completed go through the [`PreferenceStore`].
pub struct TasksModel<S: TaskStore + ?Sized, P: PreferenceStore + ?Sized> {
    store: Arc<S>,
    preferences: Arc<P>,
    search: watch::Sender<String>,
    events: EventChannel<TasksEvent>,
}

impl<S, P> TasksModel<S, P>
where
    S: TaskStore + ?Sized,
    P: PreferenceStore + ?Sized,
{
    pub fn new(store: Arc<S>, preferences: Arc<P>, event_capacity: usize) -> Self {
        let (search, _) = watch::channel(String::new());
        Self {
            store,
            preferences,
            search,
            events: EventChannel::new(event_capacity),
        }
    }

    /// Start observing the visible task list.
    pub fn tasks(&self) -> VisibleTasks {
        observe_visible_tasks(
            Arc::clone(&self.store),
            self.search.subscribe(),
            self.preferences.observe(),
        )
    }

    /// Attach the screen as the event consumer.
    pub fn events(&self) -> Option<EventSubscription<TasksEvent>> {
        self.events.attach()
    }

    pub fn search_query(&self) -> String {
        self.search.borrow().clone()
    }

    pub fn preferences(&self) -> FilterPreferences {
        *self.preferences.observe().borrow()
    }

    /// The query the visible list currently reflects.
    pub fn current_query(&self) -> TaskQuery {
        TaskQuery::new(self.search_query(), self.preferences())
    }

    pub fn on_search_query_changed(&self, query: impl Into<String>) {
        let query = query.into();
        self.search.send_if_modified(|current| {
            if *current == query {
                return false;
            }
            *current = query;
            true
        });
    }

    pub async fn on_sort_order_selected(&self, sort_order: SortOrder) -> Result<(), ModelError> {
        self.preferences.set_sort_order(sort_order).await?;
        Ok(())
    }

    pub async fn on_hide_completed_click(&self, hide_completed: bool) -> Result<(), ModelError> {
        self.preferences.set_hide_completed(hide_completed).await?;
        Ok(())
    }

    /// Create a task directly from the list screen.
    pub async fn add_task(&self, name: impl Into<String>, important: bool) -> Result<Task, ModelError> {
        let task = self.store.insert(NewTask::new(name, important)?).await?;
        info!(task_id = task.id, "Task added");
        Ok(task)
    }

    pub async fn on_task_selected(&self, task: Task) {
        self.events.send(TasksEvent::NavigateToEditTaskScreen(task)).await;
    }

    pub async fn on_task_checked_changed(&self, task: &Task, checked: bool) -> Result<(), ModelError> {
        self.store.update(&task.with_completed(checked)).await?;
        Ok(())
    }

    /// Delete the task and offer to undo it.
    pub async fn on_task_swiped(&self, task: Task) -> Result<(), ModelError> {
        self.store.delete(&task).await?;
        info!(task_id = task.id, "Task deleted");
        self.events.send(TasksEvent::ShowUndoDeleteTaskMessage(task)).await;
        Ok(())
    }

    /// Put a deleted task back with its original id.
    pub async fn on_undo_delete_click(&self, task: &Task) -> Result<(), ModelError> {
        self.store.restore(task).await?;
        info!(task_id = task.id, "Task restored");
        Ok(())
    }

    pub async fn on_add_new_task_click(&self) {
        self.events.send(TasksEvent::NavigateToAddTaskScreen).await;
    }

    pub async fn on_add_edit_result(&self, result: AddEditResult) {
        self.events
            .send(TasksEvent::ShowTaskConfirmationMessage(
                result.confirmation_message().to_string(),
            ))
            .await;
    }

    pub async fn on_delete_all_completed_click(&self) {
        self.events.send(TasksEvent::NavigateToDeleteAllCompletedDialog).await;
    }
}
