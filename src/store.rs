//! Async task store abstraction and live query results.
//!
//! Every mutation bumps a revision counter published on a `watch` channel.
//! [`LiveTasks`] pairs a [`TaskQuery`] with that channel: the first call to
//! [`LiveTasks::next`] runs the query immediately and each later call waits
//! for the store to change before running it again.
//!
//! [`SqliteTaskStore`] bumps the revision on the blocking thread right after
//! a statement commits, so a caller that stops awaiting a mutation cannot
//! leave live queries stale.

use crate::db::Database;
use crate::error::{StoreError, StoreResult};
use crate::query::TaskQuery;
use crate::types::{NewTask, Task, TaskId};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tracing::debug;

/// Durable task storage consumed by the screen models and the query engine.
#[async_trait]
pub trait TaskStore: Send + Sync + 'static {
    /// Run a query once.
    async fn query(&self, query: &TaskQuery) -> StoreResult<Vec<Task>>;

    /// Revision counter that changes after every committed mutation.
    fn changes(&self) -> watch::Receiver<u64>;

    /// Look up a single task, visible or not.
    async fn get(&self, id: TaskId) -> StoreResult<Option<Task>>;

    /// Create a task with a fresh id and the current time.
    async fn insert(&self, task: NewTask) -> StoreResult<Task>;

    /// Insert a task keeping its id, replacing any existing row with that id.
    async fn restore(&self, task: &Task) -> StoreResult<()>;

    async fn update(&self, task: &Task) -> StoreResult<()>;

    async fn delete(&self, task: &Task) -> StoreResult<()>;

    /// Remove all completed tasks atomically, returning how many were removed.
    async fn delete_completed(&self) -> StoreResult<usize>;
}

/// A query subscription that re-delivers results whenever the store changes.
pub struct LiveTasks<S: TaskStore + ?Sized> {
    store: Arc<S>,
    query: TaskQuery,
    changes: watch::Receiver<u64>,
    primed: bool,
}

impl<S: TaskStore + ?Sized> LiveTasks<S> {
    pub fn new(store: Arc<S>, query: TaskQuery) -> Self {
        let changes = store.changes();
        Self {
            store,
            query,
            changes,
            primed: false,
        }
    }

    pub fn query(&self) -> &TaskQuery {
        &self.query
    }

    /// Wait for the next result set.
    ///
    /// Fails with [`StoreError::Closed`] once the store's change channel is
    /// gone.
    pub async fn next(&mut self) -> StoreResult<Vec<Task>> {
        if self.primed {
            self.changes
                .changed()
                .await
                .map_err(|_| StoreError::Closed)?;
        }
        self.changes.borrow_and_update();
        self.primed = true;
        self.store.query(&self.query).await
    }
}

/// [`TaskStore`] backed by SQLite. Blocking work runs on the blocking pool.
#[derive(Clone)]
pub struct SqliteTaskStore {
    db: Database,
    revision: Arc<watch::Sender<u64>>,
}

impl SqliteTaskStore {
    pub fn new(db: Database) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            db,
            revision: Arc::new(revision),
        }
    }

    async fn run<T, F>(&self, op: F) -> StoreResult<T>
    where
        F: FnOnce(&Database) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || op(&db)).await?
    }

    /// Run a mutation that reports whether it changed anything. The revision
    /// is bumped inside the blocking job, right after the commit.
    async fn mutate<T, F>(&self, op: F) -> StoreResult<T>
    where
        F: FnOnce(&Database) -> StoreResult<(T, bool)> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        let revision = Arc::clone(&self.revision);
        tokio::task::spawn_blocking(move || {
            let (value, changed) = op(&db)?;
            if changed {
                notify_changed(&revision);
            }
            Ok(value)
        })
        .await?
    }
}

fn notify_changed(revision: &watch::Sender<u64>) {
    revision.send_modify(|rev| *rev = rev.wrapping_add(1));
    debug!(revision = *revision.borrow(), "Task store changed");
}

/// Sets the flag when the owning future is dropped, finished or not.
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn query(&self, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        let query = query.clone();
        let cancelled = Arc::new(AtomicBool::new(false));
        let _cancel = CancelOnDrop(Arc::clone(&cancelled));
        self.run(move |db| db.query_tasks_cancellable(&query, cancelled))
            .await
    }

    fn changes(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    async fn get(&self, id: TaskId) -> StoreResult<Option<Task>> {
        self.run(move |db| db.get_task(id)).await
    }

    async fn insert(&self, task: NewTask) -> StoreResult<Task> {
        self.mutate(move |db| Ok((db.insert_task(&task)?, true)))
            .await
    }

    async fn restore(&self, task: &Task) -> StoreResult<()> {
        let task = task.clone();
        self.mutate(move |db| Ok((db.restore_task(&task)?, true)))
            .await
    }

    async fn update(&self, task: &Task) -> StoreResult<()> {
        let task = task.clone();
        self.mutate(move |db| Ok((db.update_task(&task)?, true)))
            .await
    }

    async fn delete(&self, task: &Task) -> StoreResult<()> {
        let task_id = task.id;
        self.mutate(move |db| Ok(((), db.delete_task(task_id)?)))
            .await
    }

    async fn delete_completed(&self) -> StoreResult<usize> {
        self.mutate(|db| {
            let removed = db.delete_completed_tasks()?;
            Ok((removed, removed > 0))
        })
        .await
    }
}
