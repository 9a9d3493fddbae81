//! Configuration loading and management.
//!
//! Lookup order for the config file:
//! 1. `TODO_ENGINE_CONFIG_PATH`
//! 2. `./todo-engine/config.yaml`
//! 3. `$CONFIG_DIR/todo-engine/config.yaml` (e.g. `~/.config` on Linux)
//!
//! Environment variables are applied on top of whatever was loaded:
//! - `TODO_ENGINE_DB_PATH` - Database path
//! - `TODO_ENGINE_PREFERENCES_PATH` - Preferences file path
//! - `TODO_ENGINE_EVENT_CAPACITY` - UI event buffer size

use crate::events::DEFAULT_EVENT_CAPACITY;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_PATH_ENV: &str = "TODO_ENGINE_CONFIG_PATH";
pub const DB_PATH_ENV: &str = "TODO_ENGINE_DB_PATH";
pub const PREFERENCES_PATH_ENV: &str = "TODO_ENGINE_PREFERENCES_PATH";
pub const EVENT_CAPACITY_ENV: &str = "TODO_ENGINE_EVENT_CAPACITY";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub events: EventsConfig,
}

/// Where tasks and preferences are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Path to the preferences YAML file.
    #[serde(default = "default_preferences_path")]
    pub preferences_path: PathBuf,

    /// Insert the sample tasks when the database file is first created.
    #[serde(default = "default_seed_sample_tasks")]
    pub seed_sample_tasks: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            preferences_path: default_preferences_path(),
            seed_sample_tasks: default_seed_sample_tasks(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".todo-engine/tasks.db")
}

fn default_preferences_path() -> PathBuf {
    PathBuf::from(".todo-engine/preferences.yaml")
}

fn default_seed_sample_tasks() -> bool {
    true
}

/// UI event channel settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Number of events buffered while no consumer is attached.
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: default_event_capacity(),
        }
    }
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Candidate config files, highest priority first.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(explicit) = std::env::var(CONFIG_PATH_ENV) {
            paths.push(PathBuf::from(explicit));
        }
        paths.push(PathBuf::from("todo-engine/config.yaml"));
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("todo-engine").join("config.yaml"));
        }
        paths
    }

    /// Load from an explicit path, or the first existing search path, or
    /// defaults. Environment overrides are applied in every case.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None => match Self::search_paths().into_iter().find(|p| p.is_file()) {
                Some(path) => {
                    debug!(path = %path.display(), "Using config file");
                    Self::load(path)?
                }
                None => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(db_path) = lookup(DB_PATH_ENV) {
            self.storage.db_path = PathBuf::from(db_path);
        }

        if let Some(prefs_path) = lookup(PREFERENCES_PATH_ENV) {
            self.storage.preferences_path = PathBuf::from(prefs_path);
        }

        if let Some(capacity) = lookup(EVENT_CAPACITY_ENV) {
            if let Ok(capacity) = capacity.parse() {
                self.events.capacity = capacity;
            }
        }
    }

    /// Ensure the directories for the database and preferences exist.
    pub fn ensure_storage_dirs(&self) -> Result<()> {
        for path in [&self.storage.db_path, &self.storage.preferences_path] {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("failed to create {}", parent.display()))?;
                }
            }
        }
        Ok(())
    }
}
