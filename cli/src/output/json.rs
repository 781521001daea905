//! JSON output helpers.
//!
//! Every `--json` code path prints exactly one pretty-printed document on
//! stdout. Errors use the `{"error": true, "message", "code"}` object.

use anyhow::{Context, Result};
use serde_json::json;
use tether_common::{BatchSummary, ServiceStatusOutput};

use crate::application::services::health_check::{AlertDecision, HealthReport};
use crate::application::services::service_start::{StartOutcome, StartReport};
use crate::domain::batch::{BatchOperation, BatchRun};
use crate::domain::config::TetherConfig;

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

fn print(value: &impl serde::Serialize) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("JSON serialization failed")?
    );
    Ok(())
}

/// Renders results as JSON documents on stdout.
pub struct JsonRenderer;

impl JsonRenderer {
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn render_start(report: &StartReport) -> Result<()> {
        let outcome = match report.outcome {
            StartOutcome::Created => "created",
            StartOutcome::Started => "started",
            StartOutcome::Updated => "updated",
            StartOutcome::AlreadyRunning => "already_running",
        };
        print(&json!({
            "name": report.name.as_str(),
            "qualified_name": report.qualified_name,
            "outcome": outcome,
            "artifact_path": report.artifact_path.display().to_string(),
            "port": report.port,
            "endpoints": report.endpoints,
            "warnings": report.warnings.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "overridden_env": report.overridden_env,
        }))
    }

    /// # Errors
    /// Returns an error if serialization fails.
    pub fn render_status(status: &ServiceStatusOutput) -> Result<()> {
        print(status)
    }

    /// # Errors
    /// Returns an error if serialization fails.
    pub fn render_list(services: &[ServiceStatusOutput]) -> Result<()> {
        print(&json!({ "services": services }))
    }

    /// # Errors
    /// Returns an error if serialization fails.
    pub fn render_batch(operation: BatchOperation, run: &BatchRun) -> Result<()> {
        let results = run.results();
        print(&json!({
            "operation": operation.verb(),
            "cancelled": matches!(run, BatchRun::Cancelled),
            "results": results,
            "summary": BatchSummary::from_results(results),
        }))
    }

    /// # Errors
    /// Returns an error if serialization fails.
    pub fn render_health(report: &HealthReport) -> Result<()> {
        let (alert, alert_error) = match &report.alert {
            AlertDecision::NotNeeded => ("not_needed", None),
            AlertDecision::NotConfigured => ("not_configured", None),
            AlertDecision::Suppressed => ("suppressed", None),
            AlertDecision::Sent => ("sent", None),
            AlertDecision::Failed(e) => ("failed", Some(e.as_str())),
        };
        print(&json!({
            "name": report.name.as_str(),
            "url": report.url,
            "healthy": report.probe.healthy,
            "status_code": report.probe.status_code,
            "message": report.probe.message,
            "alert": alert,
            "alert_error": alert_error,
        }))
    }

    /// # Errors
    /// Returns an error if serialization fails.
    pub fn render_version(version: &str) -> Result<()> {
        print(&json!({ "version": version }))
    }

    /// # Errors
    /// Returns an error if serialization fails.
    pub fn render_config(config: &TetherConfig) -> Result<()> {
        print(config)
    }
}
