//! `tether start <entry>`: run a script as a supervised service.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::ProgressReporter;
use crate::application::services::config_service;
use crate::application::services::service_start::{self as service, StartReport, StartRequest};
use crate::domain::definition::DEFAULT_PORT;
use crate::output::{SilentReporter, SpinnerReporter, TerminalReporter};

/// Arguments for the start command.
#[derive(Args)]
pub struct StartArgs {
    /// Script to run (e.g. `server.ts`)
    pub entry: PathBuf,

    /// Service name (defaults to the entry file stem)
    #[arg(long)]
    pub name: Option<String>,

    /// Port exported to the service as `PORT`
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Extra environment variable, `KEY=VALUE` (repeatable)
    #[arg(long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Export OpenTelemetry tracing variables
    #[arg(long)]
    pub otel: bool,

    /// Export Prometheus metrics variables
    #[arg(long)]
    pub prometheus: bool,

    /// Compile the entry to a standalone binary first
    #[arg(long)]
    pub build: bool,
}

impl From<&StartArgs> for StartRequest {
    fn from(args: &StartArgs) -> Self {
        Self {
            entry: args.entry.clone(),
            name: args.name.clone(),
            port: args.port,
            env: args.env.clone(),
            otel: args.otel,
            prometheus: args.prometheus,
            build: args.build,
        }
    }
}

/// Run `tether start`.
///
/// # Errors
///
/// Returns an error if validation, the audit, the build, the definition
/// write or any native manager call fails.
pub async fn run(app: &AppContext, args: &StartArgs) -> Result<ExitCode> {
    let config = config_service::load_config(&app.config_store)?;
    let request = StartRequest::from(args);

    let report = if app.is_json() {
        start_with(app, &SilentReporter, &config, &request).await?
    } else if app.output.show_progress() {
        let reporter = SpinnerReporter::new(&app.output, "starting...");
        match start_with(app, &reporter, &config, &request).await {
            Ok(report) => {
                reporter.finish_ok("done");
                report
            }
            Err(e) => {
                reporter.finish_error("start failed");
                return Err(e);
            }
        }
    } else {
        start_with(app, &TerminalReporter::new(&app.output), &config, &request).await?
    };

    app.renderer().render_start(&report)?;
    Ok(ExitCode::SUCCESS)
}

async fn start_with(
    app: &AppContext,
    reporter: &impl ProgressReporter,
    config: &crate::domain::config::TetherConfig,
    request: &StartRequest,
) -> Result<StartReport> {
    service::start_service(&app.driver, &app.fs, &app.runner, reporter, config, request).await
}
