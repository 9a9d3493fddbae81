//! Core types for the to-do engine.

use crate::error::ValidationError;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Identifier assigned by the task store.
pub type TaskId = i64;

/// A single to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub important: bool,
    pub completed: bool,
    /// Creation time in milliseconds since the Unix epoch.
    pub created: i64,
}

impl Task {
    /// Copy of this task with a different completion state.
    pub fn with_completed(&self, completed: bool) -> Self {
        Self {
            completed,
            ..self.clone()
        }
    }

    /// Copy of this task with edited name and importance.
    pub fn with_details(&self, name: impl Into<String>, important: bool) -> Self {
        Self {
            name: name.into(),
            important,
            ..self.clone()
        }
    }

    /// Creation time rendered in the local timezone, e.g. "Mar 4, 2025 09:15".
    pub fn created_date_formatted(&self) -> String {
        match DateTime::from_timestamp_millis(self.created) {
            Some(utc) => utc
                .with_timezone(&Local)
                .format("%b %-d, %Y %H:%M")
                .to_string(),
            None => self.created.to_string(),
        }
    }
}

/// Input for creating a task. The store assigns `id` and `created`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub name: String,
    pub important: bool,
    pub completed: bool,
}

impl NewTask {
    /// Build a draft for a new, not yet completed task.
    ///
    /// Blank names are rejected before anything reaches the store.
    pub fn new(name: impl Into<String>, important: bool) -> Result<Self, ValidationError> {
        let name = validate_task_name(name.into())?;
        Ok(Self {
            name,
            important,
            completed: false,
        })
    }

    /// Mark the draft as already completed (used for sample data).
    pub fn completed(mut self) -> Self {
        self.completed = true;
        self
    }
}

/// Reject names that are empty or whitespace only.
pub fn validate_task_name(name: String) -> Result<String, ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(name)
}

/// Secondary ordering key for the visible task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Ascending by name, byte order (uppercase before lowercase).
    ByName,
    /// Ascending by creation time, oldest first.
    #[default]
    ByDate,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::ByName => "by_name",
            SortOrder::ByDate => "by_date",
        }
    }
}

/// Persisted list preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterPreferences {
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(default)]
    pub hide_completed: bool,
}

impl FilterPreferences {
    pub fn new(sort_order: SortOrder, hide_completed: bool) -> Self {
        Self {
            sort_order,
            hide_completed,
        }
    }
}
