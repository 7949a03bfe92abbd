//! Main CLI application structure

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{admin, label, overview, task, user};
use crate::storage::{Config, Project};
use crate::telemetry;

#[derive(Parser)]
#[command(name = "lend")]
#[command(author, version, about = "Local-first lending catalog with a reservation workflow")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to `default_format` in the global config)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Act as this registered user (ID or e-mail)
    #[arg(long = "as", global = true, value_name = "USER", env = "LEND_USER")]
    pub as_user: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new lend project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Show catalog status overview
    Status,

    /// Browse the tasks that are available to borrow
    Browse {
        /// Only tasks in this category
        #[arg(long, short)]
        category: Option<String>,

        /// Only tasks with this tag
        #[arg(long, short)]
        tag: Option<String>,

        /// Page number, starting at 1
        #[arg(long, short, default_value = "1")]
        page: usize,
    },

    /// Manage and reserve tasks
    #[command(subcommand)]
    Task(task::TaskCommands),

    /// Manage categories
    #[command(subcommand)]
    Category(label::CategoryCommands),

    /// Manage tags
    #[command(subcommand)]
    Tag(label::TagCommands),

    /// Manage users and roles
    #[command(subcommand)]
    User(user::UserCommands),

    /// Review and move reservations through the workflow
    #[command(subcommand)]
    Admin(admin::AdminCommands),

    /// Show your own reservations
    Reservations,
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = match cli.format {
        Some(format) => format,
        None => Config::load_global()?.default_format.into(),
    };
    telemetry::init(cli.verbose, format == OutputFormat::Json)?;
    let output = Output::new(format);
    let as_user = cli.as_user.as_deref();

    tracing::debug!("lend starting");

    match cli.command {
        Commands::Init { path } => {
            let project = Project::init(&path)?;
            tracing::debug!(path = %project.lend_dir().display(), "created .lend directory");
            output.success(&format!(
                "Initialized lend project at {}",
                project.root().display()
            ));
        }

        Commands::Status => overview::status(&output, as_user)?,
        Commands::Browse {
            category,
            tag,
            page,
        } => overview::browse(&output, as_user, category.as_deref(), tag.as_deref(), page)?,
        Commands::Task(cmd) => task::run(cmd, &output, as_user)?,
        Commands::Category(cmd) => label::run_category(cmd, &output, as_user)?,
        Commands::Tag(cmd) => label::run_tag(cmd, &output, as_user)?,
        Commands::User(cmd) => user::run(cmd, &output, as_user)?,
        Commands::Admin(cmd) => admin::run(cmd, &output, as_user)?,
        Commands::Reservations => overview::reservations(&output, as_user)?,
    }

    tracing::debug!("command completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn as_flag_is_global() {
        let cli = Cli::try_parse_from(["lend", "admin", "queue", "--as", "admin@example.com"])
            .unwrap();
        assert_eq!(cli.as_user.as_deref(), Some("admin@example.com"));
    }

    #[test]
    fn parses_repeated_filters() {
        let cli = Cli::try_parse_from([
            "lend", "task", "list", "--status", "pending", "--status", "reserved", "--page", "2",
        ])
        .unwrap();
        match cli.command {
            Commands::Task(task::TaskCommands::List { statuses, page, .. }) => {
                assert_eq!(statuses.len(), 2);
                assert_eq!(page, 2);
            }
            _ => panic!("expected task list"),
        }
    }
}
