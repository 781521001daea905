//! `tether remove <name...|all>`: delete services and their definitions.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::AlertStateStore;
use crate::commands::run_batch_command;
use crate::domain::batch::{BatchOperation, BatchRun};

/// Arguments for the remove command.
#[derive(Args)]
pub struct RemoveArgs {
    /// Service names, a `[a,b]` list, or `all`
    #[arg(required = true)]
    pub names: Vec<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub force: bool,

    /// Also delete log files and alert history
    #[arg(long = "remove")]
    pub purge: bool,
}

/// Run `tether remove`.
///
/// # Errors
///
/// Returns an error if the selector is invalid or the prompt fails.
pub async fn run(app: &AppContext, args: &RemoveArgs) -> Result<ExitCode> {
    let operation = BatchOperation::Remove { purge: args.purge };
    let run = run_batch_command(app, &args.names, operation, args.force).await?;

    if args.purge
        && let BatchRun::Completed(results) = &run
    {
        forget_alerts(app, results.iter().filter(|r| r.is_success()).map(|r| r.service.as_str()));
    }

    Ok(super::exit_code(&run))
}

/// Drop cooldown entries of purged services. Runs after the batch so the
/// state file has a single writer.
fn forget_alerts<'a>(app: &AppContext, services: impl Iterator<Item = &'a str>) {
    let result = app.alert_state.load().and_then(|mut state| {
        let mut changed = false;
        for service in services {
            changed |= state.forget(service);
        }
        if changed {
            app.alert_state.save(&state)?;
        }
        Ok(())
    });
    if let Err(e) = result {
        tracing::warn!("could not update alert state: {e:#}");
        if !app.is_json() {
            app.output.warn(&format!("Could not update alert state: {e:#}"));
        }
    }
}
