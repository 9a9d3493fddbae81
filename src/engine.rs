//! Live visible-task view with switch-to-latest resubscription.
//!
//! The driver task holds exactly one [`LiveTasks`] subscription at a time.
//! Whenever the search text or the preferences change, the current
//! subscription is dropped (cancelling any query still in flight) and a new
//! one is opened for the latest combination. Input changes are polled before
//! results, so a result for a superseded combination is never published.

use crate::error::StoreError;
use crate::query::TaskQuery;
use crate::store::{LiveTasks, TaskStore};
use crate::types::{FilterPreferences, Task};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Latest state of the visible task list.
#[derive(Debug, Clone)]
pub enum TaskListState {
    /// No result has been delivered for the current inputs yet.
    Loading,
    /// Visible tasks for `query`, in display order.
    Loaded { query: TaskQuery, tasks: Vec<Task> },
    /// The store failed. Terminal: no further states follow.
    Failed(Arc<StoreError>),
}

impl TaskListState {
    pub fn tasks(&self) -> Option<&[Task]> {
        match self {
            TaskListState::Loaded { tasks, .. } => Some(tasks),
            _ => None,
        }
    }

    pub fn query(&self) -> Option<&TaskQuery> {
        match self {
            TaskListState::Loaded { query, .. } => Some(query),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskListState::Failed(_))
    }
}

/// Handle to a running visible-task view. Dropping it stops the driver.
pub struct VisibleTasks {
    state: watch::Receiver<TaskListState>,
    driver: JoinHandle<()>,
}

impl VisibleTasks {
    /// Another receiver of the same state; starts at the latest value.
    pub fn subscribe(&self) -> watch::Receiver<TaskListState> {
        self.state.clone()
    }

    pub fn current(&self) -> TaskListState {
        self.state.borrow().clone()
    }

    /// Wait for the next state change and return it.
    ///
    /// Returns `None` once the driver has stopped and no new state will come.
    pub async fn changed(&mut self) -> Option<TaskListState> {
        self.state.changed().await.ok()?;
        Some(self.state.borrow_and_update().clone())
    }

    /// Wait until a loaded result for exactly `query` is available, or the
    /// view fails.
    pub async fn loaded_for(&mut self, query: &TaskQuery) -> Result<Vec<Task>, Arc<StoreError>> {
        let state = {
            let current = self
                .state
                .wait_for(|state| state.is_terminal() || state.query() == Some(query))
                .await
                .map_err(|_| Arc::new(StoreError::Closed))?;
            TaskListState::clone(&current)
        };

        match state {
            TaskListState::Loaded { tasks, .. } => Ok(tasks),
            TaskListState::Failed(err) => Err(err),
            TaskListState::Loading => Err(Arc::new(StoreError::Closed)),
        }
    }

    pub fn is_running(&self) -> bool {
        !self.driver.is_finished()
    }
}

impl Drop for VisibleTasks {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

/// Derive the live visible-task list from the search text and preferences.
///
/// Must be called from within a Tokio runtime.
pub fn observe_visible_tasks<S>(
    store: Arc<S>,
    search: watch::Receiver<String>,
    preferences: watch::Receiver<FilterPreferences>,
) -> VisibleTasks
where
    S: TaskStore + ?Sized,
{
    let (tx, rx) = watch::channel(TaskListState::Loading);
    let driver = tokio::spawn(drive(store, search, preferences, tx));
    VisibleTasks { state: rx, driver }
}

async fn drive<S>(
    store: Arc<S>,
    mut search: watch::Receiver<String>,
    mut preferences: watch::Receiver<FilterPreferences>,
    out: watch::Sender<TaskListState>,
) where
    S: TaskStore + ?Sized,
{
    let mut generation: u64 = 0;

    loop {
        let query = TaskQuery::new(
            search.borrow_and_update().clone(),
            *preferences.borrow_and_update(),
        );
        generation += 1;
        debug!(generation, ?query, "Subscribing to task query");

        let mut live = LiveTasks::new(Arc::clone(&store), query);

        loop {
            tokio::select! {
                biased;

                _ = out.closed() => {
                    debug!(generation, "No task list observers left, stopping");
                    return;
                }
                changed = search.changed() => {
                    if changed.is_err() {
                        debug!(generation, "Search input closed, stopping");
                        return;
                    }
                    break;
                }
                changed = preferences.changed() => {
                    if changed.is_err() {
                        debug!(generation, "Preferences input closed, stopping");
                        return;
                    }
                    break;
                }
                result = live.next() => match result {
                    Ok(tasks) => {
                        debug!(generation, count = tasks.len(), "Delivering visible tasks");
                        out.send_replace(TaskListState::Loaded {
                            query: live.query().clone(),
                            tasks,
                        });
                    }
                    Err(err) => {
                        warn!(generation, error = %err, "Task query failed");
                        out.send_replace(TaskListState::Failed(Arc::new(err)));
                        return;
                    }
                },
            }
        }
    }
}
