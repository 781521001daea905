//! `tether logs <name>`: tail service output with the platform's log tool.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::CommandRunner;
use crate::domain::error::ServiceError;
use crate::domain::logs::{DEFAULT_LOG_LINES, log_command};
use crate::domain::name::validate;

/// Arguments for the logs command.
#[derive(Args)]
pub struct LogsArgs {
    /// Service name
    pub name: String,

    /// Number of lines to show
    #[arg(short = 'n', long, default_value_t = DEFAULT_LOG_LINES)]
    pub lines: u32,

    /// Stream logs in real time
    #[arg(short, long)]
    pub follow: bool,
}

/// Run `tether logs`.
///
/// # Errors
///
/// Returns an error if the name is invalid, the platform is unsupported, or
/// the log tool cannot be spawned.
pub async fn run(app: &AppContext, args: &LogsArgs) -> Result<ExitCode> {
    let name = validate(&args.name)?;
    let platform = app.platform();
    let command = log_command(&name, platform, args.lines, args.follow).ok_or_else(|| {
        ServiceError::UnsupportedPlatform {
            platform: platform.os.clone(),
            operation: "logs",
        }
    })?;

    tracing::debug!(program = %command.program, args = ?command.args, "tailing logs");
    let args: Vec<&str> = command.args.iter().map(String::as_str).collect();
    let status = app
        .runner
        .run_status(&command.program, &args)
        .await
        .with_context(|| format!("failed to run {}", command.program))?;

    Ok(if status.success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
