//! Task CRUD and filtered listing.

use super::{Database, now_ms};
use crate::error::{StoreError, StoreResult};
use crate::query::TaskQuery;
use crate::types::{NewTask, Task, TaskId};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

const TASK_COLUMNS: &str = "id, name, important, completed, created";

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        name: row.get("name")?,
        important: row.get("important")?,
        completed: row.get("completed")?,
        created: row.get("created")?,
    })
}

/// Internal helper to get a task using an existing connection (avoids deadlock).
fn get_task_internal(conn: &Connection, task_id: TaskId) -> StoreResult<Option<Task>> {
    let task = conn
        .query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
            params![task_id],
            parse_task_row,
        )
        .optional()?;
    Ok(task)
}

fn insert_task_internal(conn: &Connection, new_task: &NewTask, created: i64) -> StoreResult<Task> {
    conn.execute(
        "INSERT INTO tasks (name, important, completed, created) VALUES (?1, ?2, ?3, ?4)",
        params![new_task.name, new_task.important, new_task.completed, created],
    )?;
    let id = conn.last_insert_rowid();
    debug!(task_id = id, name = %new_task.name, "Inserted task");
    Ok(Task {
        id,
        name: new_task.name.clone(),
        important: new_task.important,
        completed: new_task.completed,
        created,
    })
}

fn select_tasks(conn: &Connection, query: &TaskQuery) -> StoreResult<Vec<Task>> {
    let sql = format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE {} ORDER BY {}",
        TaskQuery::where_clause(),
        query.order_clause()
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let tasks = stmt
        .query_map(params![query.hide_completed, query.search], parse_task_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tasks)
}

/// SQLite VM steps between checks of the cancellation flag.
const INTERRUPT_CHECK_OPS: i32 = 1000;

/// The five tasks a fresh database starts with.
pub fn sample_tasks() -> Vec<NewTask> {
    vec![
        NewTask {
            name: "First Task".to_string(),
            important: false,
            completed: false,
        },
        NewTask {
            name: "Second Task".to_string(),
            important: false,
            completed: false,
        },
        NewTask {
            name: "Third Task".to_string(),
            important: true,
            completed: false,
        },
        NewTask {
            name: "Fourth Task".to_string(),
            important: false,
            completed: true,
        },
        NewTask {
            name: "Fifth Task".to_string(),
            important: false,
            completed: true,
        },
    ]
}

impl Database {
    /// Create a new task. The id is assigned by SQLite, `created` is now.
    pub fn insert_task(&self, new_task: &NewTask) -> StoreResult<Task> {
        let created = now_ms();
        self.with_conn(|conn| insert_task_internal(conn, new_task, created))
    }

    /// Insert a task with every field given, replacing any row with the same id.
    ///
    /// Used to undo a delete: the task comes back with its original id and
    /// creation time.
    pub fn restore_task(&self, task: &Task) -> StoreResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO tasks (id, name, important, completed, created)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![task.id, task.name, task.important, task.completed, task.created],
            )?;
            debug!(task_id = task.id, "Restored task");
            Ok(())
        })
    }

    /// Persist the mutable fields of a task. `id` and `created` never change.
    pub fn update_task(&self, task: &Task) -> StoreResult<()> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE tasks SET name = ?2, important = ?3, completed = ?4 WHERE id = ?1",
                params![task.id, task.name, task.important, task.completed],
            )?;
            if changed == 0 {
                return Err(StoreError::TaskNotFound(task.id));
            }
            debug!(task_id = task.id, completed = task.completed, "Updated task");
            Ok(())
        })
    }

    /// Delete a task. Returns false if it was already gone.
    pub fn delete_task(&self, task_id: TaskId) -> StoreResult<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
            debug!(task_id, deleted = changed > 0, "Deleted task");
            Ok(changed > 0)
        })
    }

    /// Delete every completed task in a single statement.
    pub fn delete_completed_tasks(&self) -> StoreResult<usize> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM tasks WHERE completed = 1", [])?;
            debug!(removed, "Deleted completed tasks");
            Ok(removed)
        })
    }

    /// Get a task by id.
    pub fn get_task(&self, task_id: TaskId) -> StoreResult<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// Number of stored tasks, visible or not.
    pub fn count_tasks(&self) -> StoreResult<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;
            Ok(count)
        })
    }

    /// List the visible tasks for a query, in display order.
    pub fn query_tasks(&self, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        self.with_conn(|conn| select_tasks(conn, query))
    }

    /// Like [`Database::query_tasks`], but aborted with
    /// [`StoreError::Cancelled`] once `cancelled` is set, including while
    /// SQLite is still stepping the statement.
    pub fn query_tasks_cancellable(
        &self,
        query: &TaskQuery,
        cancelled: Arc<AtomicBool>,
    ) -> StoreResult<Vec<Task>> {
        self.with_conn(|conn| {
            if cancelled.load(Ordering::SeqCst) {
                return Err(StoreError::Cancelled);
            }
            conn.progress_handler(
                INTERRUPT_CHECK_OPS,
                Some(move || cancelled.load(Ordering::SeqCst)),
            );
            let result = select_tasks(conn, query);
            conn.progress_handler(0, None::<fn() -> bool>);

            match result {
                Err(StoreError::Database(rusqlite::Error::SqliteFailure(err, _)))
                    if err.code == ErrorCode::OperationInterrupted =>
                {
                    debug!("Task query interrupted");
                    Err(StoreError::Cancelled)
                }
                other => other,
            }
        })
    }

    /// Insert the sample tasks in one transaction. Intended for a freshly
    /// created database.
    pub fn seed_sample_tasks(&self) -> StoreResult<usize> {
        let samples = sample_tasks();
        let created = now_ms();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            for task in &samples {
                insert_task_internal(&tx, task, created)?;
            }
            tx.commit()?;
            Ok(samples.len())
        })
    }
}
