//! Persisted list preferences (sort order and hide-completed flag).
//!
//! The pair lives in a small YAML file. Every update rewrites the whole file
//! through a temporary sibling and a rename, so readers never observe a
//! half-written pair. The current value is published on a `watch` channel and
//! only changes produce notifications.

use crate::error::StoreResult;
use crate::types::{FilterPreferences, SortOrder};
use async_trait::async_trait;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

/// Key-value store holding [`FilterPreferences`].
#[async_trait]
pub trait PreferenceStore: Send + Sync + 'static {
    /// Live view of the current preferences.
    fn observe(&self) -> watch::Receiver<FilterPreferences>;

    async fn set_sort_order(&self, sort_order: SortOrder) -> StoreResult<()>;

    async fn set_hide_completed(&self, hide_completed: bool) -> StoreResult<()>;
}

/// [`PreferenceStore`] backed by a YAML file, or by nothing at all.
pub struct FilePreferenceStore {
    path: Option<PathBuf>,
    current: watch::Sender<FilterPreferences>,
    write_lock: Mutex<()>,
}

impl FilePreferenceStore {
    /// Load preferences from `path`. A missing file yields the defaults and
    /// is created on the first update.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let read_path = path.clone();
        let initial = tokio::task::spawn_blocking(move || read_preferences(&read_path)).await??;
        info!(path = %path.display(), ?initial, "Loaded preferences");

        let (current, _) = watch::channel(initial);
        Ok(Self {
            path: Some(path),
            current,
            write_lock: Mutex::new(()),
        })
    }

    /// Preferences kept only in memory (for tests and throwaway sessions).
    pub fn in_memory(initial: FilterPreferences) -> Self {
        let (current, _) = watch::channel(initial);
        Self {
            path: None,
            current,
            write_lock: Mutex::new(()),
        }
    }

    pub fn current(&self) -> FilterPreferences {
        *self.current.borrow()
    }

    /// Read-modify-write of the pair, serialized against other updates.
    async fn update<F>(&self, apply: F) -> StoreResult<()>
    where
        F: FnOnce(&mut FilterPreferences) + Send,
    {
        let _guard = self.write_lock.lock().await;

        let previous = self.current();
        let mut next = previous;
        apply(&mut next);
        if next == previous {
            return Ok(());
        }

        if let Some(path) = self.path.clone() {
            tokio::task::spawn_blocking(move || write_preferences(&path, &next)).await??;
        }

        self.current.send_replace(next);
        debug!(?next, "Preferences updated");
        Ok(())
    }
}

#[async_trait]
impl PreferenceStore for FilePreferenceStore {
    fn observe(&self) -> watch::Receiver<FilterPreferences> {
        self.current.subscribe()
    }

    async fn set_sort_order(&self, sort_order: SortOrder) -> StoreResult<()> {
        self.update(|prefs| prefs.sort_order = sort_order).await
    }

    async fn set_hide_completed(&self, hide_completed: bool) -> StoreResult<()> {
        self.update(|prefs| prefs.hide_completed = hide_completed)
            .await
    }
}

fn read_preferences(path: &Path) -> StoreResult<FilterPreferences> {
    match fs::read_to_string(path) {
        Ok(content) if content.trim().is_empty() => Ok(FilterPreferences::default()),
        Ok(content) => Ok(serde_yaml::from_str(&content)?),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(FilterPreferences::default()),
        Err(err) => Err(err.into()),
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

fn write_preferences(path: &Path, prefs: &FilterPreferences) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let content = serde_yaml::to_string(prefs)?;

    let tmp = temp_path(path);
    let result = write_synced(&tmp, content.as_bytes()).and_then(|()| fs::rename(&tmp, path));
    if let Err(err) = result {
        if let Err(cleanup) = fs::remove_file(&tmp) {
            if cleanup.kind() != ErrorKind::NotFound {
                warn!(path = %tmp.display(), error = %cleanup, "Failed to remove temporary preferences file");
            }
        }
        return Err(err.into());
    }
    Ok(())
}

/// Write `content` and flush it to disk before returning.
fn write_synced(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content)?;
    file.sync_all()
}
