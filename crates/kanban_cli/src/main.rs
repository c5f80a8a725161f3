//! Kanban board command line client.
//!
//! # Usage
//!
//! ```text
//! kanban [--db <path>] [--log-level <level>] [--log-dir <dir>] <command>
//! kanban ping
//! kanban projects
//! kanban board <project-id>
//! kanban new-project <name> [--description <text>]
//! kanban new-column <project-id> <name>
//! kanban new-task <column-id> <name> [--description <text>]
//! kanban comment <task-id> <text>
//! kanban move-column <column-id> <position>
//! kanban move-task <task-id> <position>
//! kanban request <METHOD> <path> [--body <json>]
//! ```
//!
//! Flags override `KANBAN_DB_PATH`, `KANBAN_LOG_LEVEL` and `KANBAN_LOG_DIR`.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use kanban_api::{ApiConfig, ApiResponse, KanbanApi};
use kanban_core::LogLevel;

#[derive(Parser, Debug)]
#[command(
    name = "kanban",
    version,
    about = "Manage kanban projects, columns and tasks",
    long_about = None,
)]
struct Cli {
    /// SQLite database file.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true, value_parser = parse_log_level)]
    log_level: Option<LogLevel>,

    /// Absolute directory for rolling log files.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print core liveness and version.
    Ping,

    /// List all projects.
    Projects,

    /// Show a project with its columns, tasks and comments.
    Board { project_id: i64 },

    /// Create a project with a default column.
    NewProject {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Append a column to a project.
    NewColumn { project_id: i64, name: String },

    /// Append a task to a column.
    NewTask {
        column_id: i64,
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Add a comment to a task.
    Comment { task_id: i64, text: String },

    /// Move a column to a zero-based position among its siblings.
    MoveColumn {
        column_id: i64,
        #[arg(allow_negative_numbers = true)]
        position: i64,
    },

    /// Move a task to a zero-based position within its column.
    MoveTask {
        task_id: i64,
        #[arg(allow_negative_numbers = true)]
        position: i64,
    },

    /// Send a raw route, e.g. `request DELETE task/3`.
    Request {
        method: String,
        path: String,
        #[arg(long, default_value = "")]
        body: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let api = KanbanApi::start(resolve_config(&cli)?)
        .map_err(|err| anyhow!("failed to start logging: {err}"))?;

    let response = match cli.command {
        Commands::Ping => api.health(),
        Commands::Projects => api.get_projects(),
        Commands::Board { project_id } => api.get_board(&project_id.to_string()),
        Commands::NewProject { name, description } => api.create_project(
            &serde_json::json!({ "name": name, "description": description }).to_string(),
        ),
        Commands::NewColumn { project_id, name } => api.create_column(
            &serde_json::json!({ "project_id": project_id, "name": name }).to_string(),
        ),
        Commands::NewTask {
            column_id,
            name,
            description,
        } => api.create_task(
            &serde_json::json!({
                "column_id": column_id,
                "name": name,
                "description": description,
            })
            .to_string(),
        ),
        Commands::Comment { task_id, text } => api.create_comment(
            &serde_json::json!({ "task_id": task_id, "text": text }).to_string(),
        ),
        Commands::MoveColumn {
            column_id,
            position,
        } => api.move_column(&column_id.to_string(), &position.to_string()),
        Commands::MoveTask { task_id, position } => {
            api.move_task(&task_id.to_string(), &position.to_string())
        }
        Commands::Request { method, path, body } => api.handle(&method, &path, &body),
    };

    print_response(response)
}

fn parse_log_level(raw: &str) -> std::result::Result<LogLevel, String> {
    raw.parse().map_err(|err: kanban_core::LoggingError| err.to_string())
}

fn resolve_config(cli: &Cli) -> Result<ApiConfig> {
    let mut config =
        ApiConfig::from_env().map_err(|err| anyhow!("invalid kanban environment: {err}"))?;
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = Some(dir.clone());
    }
    Ok(config)
}

fn print_response(response: ApiResponse) -> Result<()> {
    if !response.is_success() {
        bail!("request failed with status {}: {}", response.status, response.body);
    }
    if !response.body.is_empty() {
        println!("{}", response.body);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands};
    use clap::Parser;

    #[test]
    fn move_task_accepts_negative_positions() {
        let cli = Cli::try_parse_from(["kanban", "move-task", "4", "-2"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::MoveTask {
                task_id: 4,
                position: -2
            }
        ));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli =
            Cli::try_parse_from(["kanban", "projects", "--db", "/tmp/b.db", "--log-level", "warn"])
                .unwrap();
        assert_eq!(cli.db.as_deref(), Some(std::path::Path::new("/tmp/b.db")));
        assert_eq!(cli.log_level, Some(kanban_core::LogLevel::Warn));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
