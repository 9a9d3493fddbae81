//! CLI command definitions for todo-engine
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands;
//! [`app::App`] executes them against the screen models.

pub mod app;

use crate::types::SortOrder;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Persisted to-do list
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Path to preferences file (overrides config)
    #[arg(short, long, global = true)]
    pub preferences: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the visible tasks (default if no subcommand given)
    List {
        /// Only show tasks whose name contains this text (case-sensitive)
        #[arg(short, long, default_value = "")]
        search: String,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Add a task
    Add {
        name: String,

        /// Mark the task as important
        #[arg(short, long)]
        important: bool,
    },

    /// Edit a task's name or importance
    Edit {
        id: i64,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long, value_parser = BoolishValueParser::new())]
        important: Option<bool>,
    },

    /// Mark a task as completed
    Done { id: i64 },

    /// Mark a task as not completed
    Undone { id: i64 },

    /// Delete a task
    Delete {
        id: i64,

        /// Immediately undo the deletion (restores the same id)
        #[arg(long)]
        undo: bool,
    },

    /// Delete all completed tasks
    ClearCompleted {
        /// Confirm the deletion
        #[arg(short, long)]
        yes: bool,
    },

    /// Choose the sort order
    Sort {
        #[arg(value_enum)]
        order: SortArg,
    },

    /// Hide or show completed tasks
    HideCompleted {
        #[arg(action = ArgAction::Set, value_parser = BoolishValueParser::new())]
        hide: bool,
    },
}

/// Sort order as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    ByName,
    ByDate,
}

impl From<SortArg> for SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::ByName => SortOrder::ByName,
            SortArg::ByDate => SortOrder::ByDate,
        }
    }
}
