//! To-do list engine.
//!
//! Tasks live in SQLite, list preferences in a YAML file. The task list
//! screen observes a live, filtered and sorted view of the tasks
//! ([`engine::observe_visible_tasks`]) and reacts to one-shot UI events
//! ([`events::EventChannel`]).

pub mod cli;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod events;
pub mod format;
pub mod logging;
pub mod preferences;
pub mod query;
pub mod store;
pub mod types;
pub mod ui;
