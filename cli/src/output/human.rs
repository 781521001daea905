//! Human-readable terminal renderer.

use std::path::Path;

use owo_colors::OwoColorize as _;
use tether_common::{BatchResult, BatchSummary, ServiceStatusOutput};

use crate::application::services::health_check::{AlertDecision, HealthReport};
use crate::application::services::service_start::{StartOutcome, StartReport};
use crate::domain::batch::{BatchOperation, BatchRun};
use crate::domain::config::TetherConfig;
use crate::output::OutputContext;

/// Renders results as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        println!("tether {version}");
    }

    pub fn render_start(&self, report: &StartReport) {
        let name = report.name.as_str();
        let headline = match report.outcome {
            StartOutcome::Created => format!("Service {name} created and started"),
            StartOutcome::Started => format!("Service {name} started"),
            StartOutcome::Updated => format!("Service {name} updated and restarted"),
            StartOutcome::AlreadyRunning => format!("Service {name} is already running"),
        };
        self.ctx.success(&headline);
        for key in &report.overridden_env {
            self.ctx
                .warn(&format!("--env {key} overrides a generated variable"));
        }
        if self.ctx.quiet {
            return;
        }
        println!();
        self.ctx.kv("Native name:", &report.qualified_name);
        self.ctx
            .kv("Definition: ", &report.artifact_path.display().to_string());
        self.ctx.kv("Port:       ", &report.port.to_string());
        self.ctx.kv(
            "Health:     ",
            &report.endpoints.health_url.style(self.ctx.styles.link).to_string(),
        );
        self.ctx.kv(
            "Metrics:    ",
            &report.endpoints.metrics_url.style(self.ctx.styles.link).to_string(),
        );
    }

    /// Render a single service status.
    pub fn render_status(&self, status: &ServiceStatusOutput) {
        let state = status.state.to_string();
        println!(
            "  {}  {}",
            status.name.style(self.ctx.styles.bold),
            state.style(self.ctx.styles.state(status.state))
        );
        self.ctx.kv("Native name:", &status.qualified_name);
        self.ctx
            .kv("Enabled:    ", if status.enabled { "yes" } else { "no" });
        if let Some(pid) = status.pid {
            self.ctx.kv("PID:        ", &pid.to_string());
        }
        if let Some(path) = &status.artifact_path {
            self.ctx.kv("Definition: ", path);
        }
        if let Some(endpoints) = &status.endpoints {
            self.ctx.kv("Health:     ", &endpoints.health_url);
            self.ctx.kv("Metrics:    ", &endpoints.metrics_url);
        }
    }

    /// Render the table of managed services.
    pub fn render_list(&self, services: &[ServiceStatusOutput]) {
        if services.is_empty() {
            if !self.ctx.quiet {
                println!("No managed services. Start one: tether start <entry>");
            }
            return;
        }
        println!(
            "  {}",
            format!("{:<24} {:<10} {:<8} {:<8} {}", "NAME", "STATE", "ENABLED", "PID", "PORT")
                .style(self.ctx.styles.header)
        );
        for s in services {
            let state = format!("{:<10}", s.state.to_string());
            let pid = s.pid.map_or_else(|| "-".to_string(), |p| p.to_string());
            let port = s.port.map_or_else(|| "-".to_string(), |p| p.to_string());
            println!(
                "  {:<24} {} {:<8} {:<8} {port}",
                s.name,
                state.style(self.ctx.styles.state(s.state)),
                if s.enabled { "yes" } else { "no" },
                pid,
            );
        }
    }

    /// Render per-service batch results followed by the summary counts.
    pub fn render_batch(&self, operation: BatchOperation, run: &BatchRun) {
        let results = match run {
            BatchRun::Cancelled => {
                println!("Cancelled.");
                return;
            }
            BatchRun::Completed(results) => results,
        };
        for result in results {
            self.render_batch_line(operation, result);
        }
        let summary = BatchSummary::from_results(results);
        if summary.total > 1 && !self.ctx.quiet {
            println!();
            println!(
                "  {} total, {} succeeded ({:.0}%), {} failed ({:.0}%)",
                summary.total,
                summary.succeeded.style(self.ctx.styles.success),
                summary.success_percent,
                summary.failed.style(if summary.failed > 0 {
                    self.ctx.styles.error
                } else {
                    self.ctx.styles.dim
                }),
                summary.failure_percent,
            );
        }
    }

    fn render_batch_line(&self, operation: BatchOperation, result: &BatchResult) {
        if result.is_success() {
            self.ctx
                .success(&format!("{} {}", result.service, operation.past_tense()));
        } else {
            let error = result.error.as_deref().unwrap_or("unknown error");
            self.ctx.error(&format!(
                "{} could not be {}: {error}",
                result.service,
                operation.past_tense()
            ));
        }
    }

    pub fn render_health(&self, report: &HealthReport) {
        let name = report.name.as_str();
        let code = report
            .probe
            .status_code
            .map_or_else(String::new, |c| format!(" (HTTP {c})"));
        if report.is_healthy() {
            self.ctx.success(&format!("{name} is healthy{code}"));
        } else {
            self.ctx.error(&format!(
                "{name} is unhealthy{code}: {}",
                report.probe.message
            ));
        }
        self.ctx.kv("Endpoint:", &report.url);
        match &report.alert {
            AlertDecision::NotNeeded => {}
            AlertDecision::NotConfigured => self
                .ctx
                .info("No alert webhook configured (tether config set alerts.webhook <url>)"),
            AlertDecision::Suppressed => self.ctx.info("Alert suppressed (cooldown active)"),
            AlertDecision::Sent => self.ctx.info("Alert sent"),
            AlertDecision::Failed(e) => self.ctx.warn(&format!("Alert delivery failed: {e}")),
        }
    }

    /// Render the current configuration.
    pub fn render_config(&self, config: &TetherConfig, path: &Path) {
        println!();
        println!(
            "  {}",
            format!("Configuration ({})", path.display()).style(self.ctx.styles.header)
        );
        println!();
        println!("  {:<24} {}", "runtime:", config.runtime);
        println!("  {:<24} {}", "otel.endpoint:", config.otel.endpoint);
        println!(
            "  {:<24} {}",
            "alerts.webhook:",
            config.alerts.webhook.as_deref().unwrap_or("(not set)")
        );
        println!("  {:<24} {}", "alerts.cooldown_secs:", config.alerts.cooldown_secs);
        println!();
        println!("  {}", "Environment:".style(self.ctx.styles.bold));
        println!(
            "    {:<18} {}",
            "TETHER_CONFIG:",
            std::env::var("TETHER_CONFIG").unwrap_or_else(|_| "(not set)".to_string())
        );
        println!(
            "    {:<18} {}",
            "NO_COLOR:",
            std::env::var("NO_COLOR").unwrap_or_else(|_| "(not set)".to_string())
        );
        println!();
    }
}
