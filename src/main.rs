//! todo-engine
//!
//! Command-line front end for the persisted to-do list.

use anyhow::Result;
use clap::Parser;
use todo_engine::cli::app::App;
use todo_engine::cli::{Cli, Command};
use todo_engine::config::Config;
use todo_engine::logging::{self, LogTarget};
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let mut config = Config::load_or_default(cli.config.as_deref())?;

    // Override paths from CLI arguments
    if let Some(db_path) = &cli.database {
        config.storage.db_path = db_path.clone();
    }
    if let Some(prefs_path) = &cli.preferences {
        config.storage.preferences_path = prefs_path.clone();
    }
    debug!(?config, "Resolved configuration");

    let app = App::open(&config).await?;

    let command = cli.command.unwrap_or(Command::List {
        search: String::new(),
        format: "text".to_string(),
    });

    let mut stdout = std::io::stdout().lock();
    app.execute(command, &mut stdout).await
}
