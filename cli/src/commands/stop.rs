//! `tether stop <name...|all>`

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::commands::{BatchArgs, run_batch_command};
use crate::domain::batch::BatchOperation;

/// Run `tether stop`.
///
/// # Errors
///
/// Returns an error if the selector is invalid or the prompt fails.
pub async fn run(app: &AppContext, args: &BatchArgs) -> Result<ExitCode> {
    let run = run_batch_command(app, &args.names, BatchOperation::Stop, args.force).await?;
    Ok(super::exit_code(&run))
}
