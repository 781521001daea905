//! `tether status [name]`: one service in detail, or every managed service.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::service_control::{list_services, status_service};
use crate::domain::name::validate;

/// Arguments for the status command.
#[derive(Args)]
pub struct StatusArgs {
    /// Service to show (omit to list all)
    pub name: Option<String>,
}

/// Run `tether status`.
///
/// # Errors
///
/// Returns an error if the name is invalid or the manager cannot be queried.
pub async fn run(app: &AppContext, args: &StatusArgs) -> Result<ExitCode> {
    match &args.name {
        Some(raw) => {
            let name = validate(raw)?;
            let status = status_service(&app.driver, &app.fs, &name).await?;
            app.renderer().render_status(&status)?;
        }
        None => {
            let services = list_services(&app.driver, &app.fs).await?;
            app.renderer().render_list(&services)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}
