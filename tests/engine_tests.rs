//! Integration tests for the live visible-task view.
//!
//! These tests drive `observe_visible_tasks` with real `watch` inputs and
//! verify re-delivery on store changes, resubscription on input changes,
//! cancellation of superseded queries and terminal failures.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use todo_engine::db::Database;
use todo_engine::engine::{TaskListState, observe_visible_tasks};
use todo_engine::error::{StoreError, StoreResult};
use todo_engine::preferences::{FilePreferenceStore, PreferenceStore};
use todo_engine::query::TaskQuery;
use todo_engine::store::{SqliteTaskStore, TaskStore};
use todo_engine::types::{FilterPreferences, NewTask, SortOrder, Task, TaskId};
use tokio::sync::{Notify, watch};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn sqlite_store() -> SqliteTaskStore {
    SqliteTaskStore::new(Database::open_in_memory().expect("Failed to create in-memory database"))
}

fn names(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|t| t.name.as_str()).collect()
}

async fn add(store: &impl TaskStore, name: &str, important: bool) -> Task {
    store
        .insert(NewTask::new(name, important).unwrap())
        .await
        .expect("Failed to insert task")
}

/// Sets its flag when dropped.
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Store whose query never completes for one particular search text.
struct GatedStore {
    inner: SqliteTaskStore,
    slow_search: String,
    slow_started: Notify,
    slow_cancelled: Arc<AtomicBool>,
    queries: AtomicUsize,
}

impl GatedStore {
    fn new(slow_search: &str) -> Self {
        Self {
            inner: sqlite_store(),
            slow_search: slow_search.to_string(),
            slow_started: Notify::new(),
            slow_cancelled: Arc::new(AtomicBool::new(false)),
            queries: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TaskStore for GatedStore {
    async fn query(&self, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if query.search == self.slow_search {
            let _flag = DropFlag(Arc::clone(&self.slow_cancelled));
            self.slow_started.notify_one();
            return std::future::pending::<StoreResult<Vec<Task>>>().await;
        }
        self.inner.query(query).await
    }

    fn changes(&self) -> watch::Receiver<u64> {
        self.inner.changes()
    }

    async fn get(&self, id: TaskId) -> StoreResult<Option<Task>> {
        self.inner.get(id).await
    }

    async fn insert(&self, task: NewTask) -> StoreResult<Task> {
        self.inner.insert(task).await
    }

    async fn restore(&self, task: &Task) -> StoreResult<()> {
        self.inner.restore(task).await
    }

    async fn update(&self, task: &Task) -> StoreResult<()> {
        self.inner.update(task).await
    }

    async fn delete(&self, task: &Task) -> StoreResult<()> {
        self.inner.delete(task).await
    }

    async fn delete_completed(&self) -> StoreResult<usize> {
        self.inner.delete_completed().await
    }
}

/// Store whose queries always fail.
struct BrokenStore {
    changes: watch::Sender<u64>,
}

#[async_trait]
impl TaskStore for BrokenStore {
    async fn query(&self, _query: &TaskQuery) -> StoreResult<Vec<Task>> {
        Err(StoreError::Io(std::io::Error::other("disk unplugged")))
    }

    fn changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    async fn get(&self, _id: TaskId) -> StoreResult<Option<Task>> {
        Err(StoreError::Closed)
    }

    async fn insert(&self, _task: NewTask) -> StoreResult<Task> {
        Err(StoreError::Closed)
    }

    async fn restore(&self, _task: &Task) -> StoreResult<()> {
        Err(StoreError::Closed)
    }

    async fn update(&self, _task: &Task) -> StoreResult<()> {
        Err(StoreError::Closed)
    }

    async fn delete(&self, _task: &Task) -> StoreResult<()> {
        Err(StoreError::Closed)
    }

    async fn delete_completed(&self) -> StoreResult<usize> {
        Err(StoreError::Closed)
    }
}

#[tokio::test]
async fn delivers_initial_result_and_store_updates() {
    let store = Arc::new(sqlite_store());
    add(store.as_ref(), "Existing", false).await;

    let (_search_tx, search_rx) = watch::channel(String::new());
    let (_prefs_tx, prefs_rx) = watch::channel(FilterPreferences::default());
    let mut visible = observe_visible_tasks(Arc::clone(&store), search_rx, prefs_rx);

    let q = TaskQuery::default();
    let tasks = timeout(WAIT, visible.loaded_for(&q)).await.unwrap().unwrap();
    assert_eq!(names(&tasks), vec!["Existing"]);

    add(store.as_ref(), "Urgent", true).await;
    let state = timeout(WAIT, visible.changed()).await.unwrap().unwrap();
    assert_eq!(names(state.tasks().unwrap()), vec!["Urgent", "Existing"]);
}

#[tokio::test]
async fn resubscribes_on_search_change() {
    let store = Arc::new(sqlite_store());
    add(store.as_ref(), "Buy milk", false).await;
    add(store.as_ref(), "Walk dog", false).await;

    let (search_tx, search_rx) = watch::channel(String::new());
    let (_prefs_tx, prefs_rx) = watch::channel(FilterPreferences::default());
    let mut visible = observe_visible_tasks(Arc::clone(&store), search_rx, prefs_rx);

    let all = timeout(WAIT, visible.loaded_for(&TaskQuery::default()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(all.len(), 2);

    search_tx.send("dog".to_string()).unwrap();
    let q = TaskQuery::new("dog", FilterPreferences::default());
    let filtered = timeout(WAIT, visible.loaded_for(&q)).await.unwrap().unwrap();
    assert_eq!(names(&filtered), vec!["Walk dog"]);
}

#[tokio::test]
async fn resubscribes_on_preference_change() {
    let store = Arc::new(sqlite_store());
    add(store.as_ref(), "zebra", false).await;
    add(store.as_ref(), "aardvark", false).await;
    let done = add(store.as_ref(), "mole", false).await;
    store.update(&done.with_completed(true)).await.unwrap();

    let prefs = FilePreferenceStore::in_memory(FilterPreferences::default());
    let (_search_tx, search_rx) = watch::channel(String::new());
    let mut visible = observe_visible_tasks(Arc::clone(&store), search_rx, prefs.observe());

    let by_date = timeout(WAIT, visible.loaded_for(&TaskQuery::default()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(names(&by_date), vec!["zebra", "aardvark", "mole"]);

    prefs.set_sort_order(SortOrder::ByName).await.unwrap();
    prefs.set_hide_completed(true).await.unwrap();

    let q = TaskQuery::new("", FilterPreferences::new(SortOrder::ByName, true));
    let by_name = timeout(WAIT, visible.loaded_for(&q)).await.unwrap().unwrap();
    assert_eq!(names(&by_name), vec!["aardvark", "zebra"]);
}

#[tokio::test]
async fn superseded_query_is_cancelled_not_delivered() {
    let store = Arc::new(GatedStore::new("slow"));
    add(store.as_ref(), "fast task", false).await;

    let (search_tx, search_rx) = watch::channel("slow".to_string());
    let (_prefs_tx, prefs_rx) = watch::channel(FilterPreferences::default());
    let mut visible = observe_visible_tasks(Arc::clone(&store), search_rx, prefs_rx);

    timeout(WAIT, store.slow_started.notified()).await.unwrap();
    assert!(matches!(visible.current(), TaskListState::Loading));

    search_tx.send("fast".to_string()).unwrap();
    let q = TaskQuery::new("fast", FilterPreferences::default());
    let tasks = timeout(WAIT, visible.loaded_for(&q)).await.unwrap().unwrap();

    assert_eq!(names(&tasks), vec!["fast task"]);
    assert!(store.slow_cancelled.load(Ordering::SeqCst));
    assert_eq!(visible.current().query(), Some(&q));
}

#[tokio::test]
async fn rapid_input_changes_settle_on_latest() {
    let store = Arc::new(sqlite_store());
    add(store.as_ref(), "alpha", false).await;
    add(store.as_ref(), "beta", false).await;
    add(store.as_ref(), "gamma", false).await;

    let (search_tx, search_rx) = watch::channel(String::new());
    let (prefs_tx, prefs_rx) = watch::channel(FilterPreferences::default());
    let mut visible = observe_visible_tasks(Arc::clone(&store), search_rx, prefs_rx);

    for search in ["a", "al", "alp", "e"] {
        search_tx.send(search.to_string()).unwrap();
    }
    prefs_tx
        .send(FilterPreferences::new(SortOrder::ByName, false))
        .unwrap();

    let latest = TaskQuery::new("e", FilterPreferences::new(SortOrder::ByName, false));
    let tasks = timeout(WAIT, visible.loaded_for(&latest)).await.unwrap().unwrap();
    assert_eq!(names(&tasks), vec!["beta"]);

    // Nothing for an older combination shows up afterwards.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(visible.current().query(), Some(&latest));
}

#[tokio::test]
async fn late_subscriber_sees_latest_state() {
    let store = Arc::new(sqlite_store());
    add(store.as_ref(), "only", false).await;

    let (_search_tx, search_rx) = watch::channel(String::new());
    let (_prefs_tx, prefs_rx) = watch::channel(FilterPreferences::default());
    let mut visible = observe_visible_tasks(Arc::clone(&store), search_rx, prefs_rx);
    timeout(WAIT, visible.loaded_for(&TaskQuery::default()))
        .await
        .unwrap()
        .unwrap();

    let late = visible.subscribe();
    let state = late.borrow().clone();
    assert_eq!(names(state.tasks().unwrap()), vec!["only"]);
}

#[tokio::test]
async fn store_failure_is_terminal() {
    let (changes, _) = watch::channel(0);
    let store = Arc::new(BrokenStore { changes });

    let (_search_tx, search_rx) = watch::channel(String::new());
    let (_prefs_tx, prefs_rx) = watch::channel(FilterPreferences::default());
    let mut visible = observe_visible_tasks(store, search_rx, prefs_rx);

    let err = timeout(WAIT, visible.loaded_for(&TaskQuery::default()))
        .await
        .unwrap()
        .unwrap_err();
    assert!(matches!(err.as_ref(), StoreError::Io(_)));

    // The driver stops after a failure.
    assert!(timeout(WAIT, visible.changed()).await.unwrap().is_none());
    assert!(!visible.is_running());
}

#[tokio::test]
async fn dropping_view_releases_subscription() {
    let store = Arc::new(GatedStore::new("never"));
    add(store.as_ref(), "x", false).await;

    let (search_tx, search_rx) = watch::channel(String::new());
    let (_prefs_tx, prefs_rx) = watch::channel(FilterPreferences::default());
    let mut visible = observe_visible_tasks(Arc::clone(&store), search_rx, prefs_rx);
    timeout(WAIT, visible.loaded_for(&TaskQuery::default()))
        .await
        .unwrap()
        .unwrap();

    let mut observer = visible.subscribe();
    drop(visible);

    // The driver was aborted, so the state channel closes...
    assert!(timeout(WAIT, observer.changed()).await.unwrap().is_err());

    // ...and further input or store changes trigger no more queries.
    let before = store.queries.load(Ordering::SeqCst);
    let _ = search_tx.send("x".to_string());
    add(store.as_ref(), "y", false).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.queries.load(Ordering::SeqCst), before);
}

#[tokio::test]
async fn closing_search_input_stops_driver() {
    let store = Arc::new(sqlite_store());

    let (search_tx, search_rx) = watch::channel(String::new());
    let (_prefs_tx, prefs_rx) = watch::channel(FilterPreferences::default());
    let mut visible = observe_visible_tasks(store, search_rx, prefs_rx);
    timeout(WAIT, visible.loaded_for(&TaskQuery::default()))
        .await
        .unwrap()
        .unwrap();

    drop(search_tx);
    assert!(timeout(WAIT, visible.changed()).await.unwrap().is_none());
}
