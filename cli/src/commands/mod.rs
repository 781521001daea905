//! Command implementations

pub mod config;
pub mod health;
pub mod logs;
pub mod remove;
pub mod restart;
pub mod start;
pub mod status;
pub mod stop;
pub mod version;

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::batch;
use crate::domain::batch::{BatchOperation, BatchRun};
use crate::domain::selector::Selector;

/// Arguments shared by `stop` and `restart`.
#[derive(Args)]
pub struct BatchArgs {
    /// Service names, a `[a,b]` list, or `all`
    #[arg(required = true)]
    pub names: Vec<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub force: bool,
}

/// Parse the selector, run the batch and render its results.
pub(crate) async fn run_batch_command(
    app: &AppContext,
    names: &[String],
    operation: BatchOperation,
    force: bool,
) -> Result<BatchRun> {
    let selector = Selector::parse(names);
    let run = batch::run_batch(
        &app.driver,
        &app.fs,
        &app.confirmer,
        &selector,
        operation,
        force,
    )
    .await?;
    app.renderer().render_batch(operation, &run)?;
    Ok(run)
}

/// Success only when every member succeeded. A cancelled batch is not a
/// failure.
pub(crate) fn exit_code(run: &BatchRun) -> ExitCode {
    if matches!(run, BatchRun::Cancelled) || run.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
