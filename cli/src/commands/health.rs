//! `tether health <name>`: probe `/healthz` and alert when it fails.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::AlertStateStore;
use crate::application::services::config_service;
use crate::application::services::health_check::{HealthDeps, check_health};
use crate::domain::name::validate;
use crate::infra::http::{UreqAlertSink, UreqHealthProbe};

/// Arguments for the health command.
#[derive(Args)]
pub struct HealthArgs {
    /// Service name
    pub name: String,
}

/// Run `tether health`. Exits 1 when the service is unhealthy.
///
/// # Errors
///
/// Returns an error if the name is invalid, the service has no definition,
/// or the alert state cannot be read or saved.
pub async fn run(app: &AppContext, args: &HealthArgs) -> Result<ExitCode> {
    let name = validate(&args.name)?;
    let config = config_service::load_config(&app.config_store)?;
    let mut state = app.alert_state.load()?;

    let report = check_health(
        &app.driver,
        &app.fs,
        HealthDeps {
            probe: &UreqHealthProbe,
            sink: &UreqAlertSink,
            store: &app.alert_state,
        },
        &mut state,
        &config.alerts,
        &name,
        chrono::Utc::now(),
    )
    .await?;

    app.renderer().render_health(&report)?;
    Ok(if report.is_healthy() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
