//! Error types shared by the stores and the screen models.

use crate::types::TaskId;
use thiserror::Error;

/// Failure reported by the task store or the preference store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] refinery::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid preferences file: {0}")]
    Preferences(#[from] serde_yaml::Error),

    #[error("storage worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("database connection lock poisoned")]
    Poisoned,

    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("store closed")]
    Closed,

    #[error("query cancelled")]
    Cancelled,
}

/// User input rejected before it reaches a store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Name cannot be empty")]
    EmptyName,
}

/// Error returned by screen model intents.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
