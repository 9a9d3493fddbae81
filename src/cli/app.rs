//! Executes CLI commands through the screen models.
//!
//! The command line plays the part of the presentation layer: it forwards
//! intents to [`TasksModel`] and friends, then drains the one-shot events the
//! models emit and prints a reaction for each.

use super::Command;
use crate::config::Config;
use crate::db::Database;
use crate::events::{AddEditTaskEvent, TasksEvent};
use crate::format::{OutputFormat, format_tasks_json, format_tasks_text};
use crate::preferences::FilePreferenceStore;
use crate::store::{SqliteTaskStore, TaskStore};
use crate::types::{Task, TaskId};
use crate::ui::{AddEditTaskModel, DeleteAllCompletedModel, TasksModel};
use anyhow::{Context, Result, anyhow, bail};
use std::io::Write;
use std::sync::Arc;
use tracing::info;

pub struct App {
    store: Arc<SqliteTaskStore>,
    tasks: TasksModel<SqliteTaskStore, FilePreferenceStore>,
    event_capacity: usize,
}

impl App {
    /// Open the stores named by `config`, seeding a brand new database if
    /// configured to.
    pub async fn open(config: &Config) -> Result<Self> {
        config.ensure_storage_dirs()?;

        let db_path = &config.storage.db_path;
        let fresh = !db_path.exists();
        let db = Database::open(db_path)
            .with_context(|| format!("failed to open database {}", db_path.display()))?;
        if fresh && config.storage.seed_sample_tasks {
            let seeded = db.seed_sample_tasks()?;
            info!(seeded, "Seeded new database with sample tasks");
        }

        let preferences = FilePreferenceStore::open(&config.storage.preferences_path)
            .await
            .with_context(|| {
                format!(
                    "failed to load preferences {}",
                    config.storage.preferences_path.display()
                )
            })?;

        Ok(Self::from_parts(
            SqliteTaskStore::new(db),
            preferences,
            config.events.capacity,
        ))
    }

    pub fn from_parts(
        store: SqliteTaskStore,
        preferences: FilePreferenceStore,
        event_capacity: usize,
    ) -> Self {
        let store = Arc::new(store);
        let tasks = TasksModel::new(Arc::clone(&store), Arc::new(preferences), event_capacity);
        Self {
            store,
            tasks,
            event_capacity,
        }
    }

    pub async fn execute(&self, command: Command, out: &mut dyn Write) -> Result<()> {
        match command {
            Command::List { search, format } => {
                let format = OutputFormat::from_str(&format)
                    .ok_or_else(|| anyhow!("unknown output format: {format}"))?;
                self.list(&search, format, out).await?;
            }
            Command::Add { name, important } => {
                let mut form =
                    AddEditTaskModel::for_new_task(Arc::clone(&self.store), self.event_capacity);
                form.task_name = name;
                form.task_importance = important;
                self.save_form(&form, out).await?;
            }
            Command::Edit {
                id,
                name,
                important,
            } => {
                let task = self.find_task(id).await?;
                self.tasks.on_task_selected(task).await;

                // The edit screen is opened by the navigation event.
                let Some(task) = self.react(out)? else {
                    bail!("task #{id} could not be opened for editing");
                };
                let mut form =
                    AddEditTaskModel::for_task(Arc::clone(&self.store), task, self.event_capacity);
                if let Some(label) = form.created_label() {
                    writeln!(out, "{label}")?;
                }
                if let Some(name) = name {
                    form.task_name = name;
                }
                if let Some(important) = important {
                    form.task_importance = important;
                }
                self.save_form(&form, out).await?;
            }
            Command::Done { id } => {
                let task = self.find_task(id).await?;
                self.tasks.on_task_checked_changed(&task, true).await?;
                writeln!(out, "Completed \"{}\"", task.name)?;
            }
            Command::Undone { id } => {
                let task = self.find_task(id).await?;
                self.tasks.on_task_checked_changed(&task, false).await?;
                writeln!(out, "Reopened \"{}\"", task.name)?;
            }
            Command::Delete { id, undo } => {
                let task = self.find_task(id).await?;
                self.tasks.on_task_swiped(task).await?;
                let deleted = self.react(out)?;
                if undo {
                    if let Some(task) = deleted {
                        self.tasks.on_undo_delete_click(&task).await?;
                        writeln!(out, "Restored \"{}\"", task.name)?;
                    }
                }
            }
            Command::ClearCompleted { yes } => {
                self.tasks.on_delete_all_completed_click().await;
                self.react(out)?;
                if yes {
                    let dialog = DeleteAllCompletedModel::new(Arc::clone(&self.store));
                    let removed = dialog.on_confirm_click().await??;
                    writeln!(out, "Deleted {removed} completed task(s)")?;
                } else {
                    writeln!(out, "Re-run with --yes to delete all completed tasks")?;
                }
            }
            Command::Sort { order } => {
                self.tasks.on_sort_order_selected(order.into()).await?;
                writeln!(out, "Sorting by {}", self.tasks.preferences().sort_order.as_str())?;
            }
            Command::HideCompleted { hide } => {
                self.tasks.on_hide_completed_click(hide).await?;
                let state = if hide { "hidden" } else { "shown" };
                writeln!(out, "Completed tasks are {state}")?;
            }
        }
        Ok(())
    }

    async fn list(&self, search: &str, format: OutputFormat, out: &mut dyn Write) -> Result<()> {
        self.tasks.on_search_query_changed(search);
        let query = self.tasks.current_query();

        let mut visible = self.tasks.tasks();
        let tasks = visible
            .loaded_for(&query)
            .await
            .map_err(|err| anyhow!("failed to load tasks: {err}"))?;

        let prefs = query.preferences();
        match format {
            OutputFormat::Text => write!(out, "{}", format_tasks_text(&tasks, search, &prefs))?,
            OutputFormat::Json => writeln!(
                out,
                "{}",
                serde_json::to_string_pretty(&format_tasks_json(&tasks, search, &prefs))?
            )?,
        }
        Ok(())
    }

    /// Save an add/edit form and route its result back to the task list.
    async fn save_form(
        &self,
        form: &AddEditTaskModel<SqliteTaskStore>,
        out: &mut dyn Write,
    ) -> Result<()> {
        form.on_save_click().await?;

        let mut events = form
            .events()
            .ok_or_else(|| anyhow!("add/edit events already attached"))?;
        for event in events.drain() {
            match event {
                AddEditTaskEvent::ShowInvalidInputMessage(message) => bail!(message),
                AddEditTaskEvent::NavigateBackWithResult(result) => {
                    self.tasks.on_add_edit_result(result).await;
                }
            }
        }
        self.react(out)?;
        Ok(())
    }

    /// Drain pending task list events and print a reaction for each.
    ///
    /// Returns the task carried by the last navigation or undo event, if any.
    fn react(&self, out: &mut dyn Write) -> Result<Option<Task>> {
        let mut events = self
            .tasks
            .events()
            .ok_or_else(|| anyhow!("task events already attached"))?;

        let mut carried = None;
        for event in events.drain() {
            match event {
                TasksEvent::NavigateToAddTaskScreen => {
                    writeln!(out, "Add Task")?;
                }
                TasksEvent::NavigateToEditTaskScreen(task) => {
                    writeln!(out, "Edit Task #{}", task.id)?;
                    carried = Some(task);
                }
                TasksEvent::ShowUndoDeleteTaskMessage(task) => {
                    writeln!(out, "Task Deleted: \"{}\"", task.name)?;
                    carried = Some(task);
                }
                TasksEvent::ShowTaskConfirmationMessage(message) => {
                    writeln!(out, "{message}")?;
                }
                TasksEvent::NavigateToDeleteAllCompletedDialog => {
                    writeln!(out, "Do you really want to delete all completed tasks?")?;
                }
            }
        }
        Ok(carried)
    }

    async fn find_task(&self, id: TaskId) -> Result<Task> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| anyhow!("task not found: {id}"))
    }
}
