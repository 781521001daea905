//! CLI argument parsing with clap derive

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags};
use crate::commands;

/// Run scripts as supervised background services
#[derive(Parser)]
#[command(
    name = "tether",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Log more (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start a script as a background service (creating it if needed)
    Start(commands::start::StartArgs),

    /// Stop services
    Stop(commands::BatchArgs),

    /// Restart services
    Restart(commands::BatchArgs),

    /// Show one service, or list every managed service
    Status(commands::status::StatusArgs),

    /// Remove services and their definitions
    #[command(visible_alias = "delete")]
    Remove(commands::remove::RemoveArgs),

    /// Show service logs
    Logs(commands::logs::LogsArgs),

    /// Probe a service's health endpoint and alert if it is down
    Health(commands::health::HealthArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails outright. Partial batch failures
    /// are reported and mapped to `ExitCode::FAILURE` instead.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            json,
            quiet,
            no_color,
            command,
            ..
        } = self;
        let app = AppContext::new(&AppFlags {
            no_color,
            quiet,
            json,
        });

        match command {
            Command::Start(args) => commands::start::run(&app, &args).await,
            Command::Stop(args) => commands::stop::run(&app, &args).await,
            Command::Restart(args) => commands::restart::run(&app, &args).await,
            Command::Status(args) => commands::status::run(&app, &args).await,
            Command::Remove(args) => commands::remove::run(&app, &args).await,
            Command::Logs(args) => commands::logs::run(&app, &args).await,
            Command::Health(args) => commands::health::run(&app, &args).await,
            Command::Config(cmd) => commands::config::run(&app, cmd),
            Command::Version => commands::version::run(&app),
        }
    }
}
