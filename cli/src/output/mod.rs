//! Output formatting module

pub mod human;
pub mod json;
pub mod progress;
pub mod reporter;
pub mod styles;

use std::path::Path;

use anyhow::Result;
use console::Term;
use owo_colors::OwoColorize as _;
use tether_common::ServiceStatusOutput;

pub use human::HumanRenderer;
pub use json::JsonRenderer;
pub use reporter::{SilentReporter, SpinnerReporter, TerminalReporter};
pub use styles::Styles;

use crate::application::services::health_check::HealthReport;
use crate::application::services::service_start::StartReport;
use crate::domain::batch::{BatchOperation, BatchRun};
use crate::domain::config::TetherConfig;

/// Output context carrying styling and terminal state.
pub struct OutputContext {
    /// Stylesheet for colored output.
    pub styles: Styles,
    /// Whether stdout is a TTY.
    pub is_tty: bool,
    /// Whether to suppress non-error output.
    pub quiet: bool,
}

impl OutputContext {
    /// Create output context based on CLI flags and environment.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let use_colors = !no_color && is_tty && std::env::var("NO_COLOR").is_err();

        let mut styles = Styles::default();
        if use_colors {
            styles.colorize();
        }

        Self {
            styles,
            is_tty,
            quiet,
        }
    }

    /// Check if progress indicators should be shown.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        self.is_tty && !self.quiet
    }

    /// Print a success message prefixed with `✓`. Suppressed when `quiet`.
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "✓".style(self.styles.success));
        }
    }

    /// Print a warning message prefixed with `⚠`. Suppressed when `quiet`.
    pub fn warn(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "⚠".style(self.styles.warning));
        }
    }

    /// Print an error message prefixed with `✗` to stderr. Never suppressed.
    pub fn error(&self, msg: &str) {
        eprintln!("  {} {msg}", "✗".style(self.styles.error));
    }

    /// Print an info message prefixed with `ℹ`. Suppressed when `quiet`.
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "ℹ".style(self.styles.info));
        }
    }

    /// Print a section header. Suppressed when `quiet`.
    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("  {}", msg.style(self.styles.header));
        }
    }

    /// Print a key-value pair with the key dimmed. Suppressed when `quiet`.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {}  {value}", key.style(self.styles.dim));
        }
    }
}

/// Output renderer selected by `--json`.
pub enum Renderer<'a> {
    Human(HumanRenderer<'a>),
    Json(JsonRenderer),
}

impl Renderer<'_> {
    /// # Errors
    /// Returns an error if JSON serialization fails.
    pub fn render_start(&self, report: &StartReport) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_start(report);
                Ok(())
            }
            Self::Json(_) => JsonRenderer::render_start(report),
        }
    }

    /// # Errors
    /// Returns an error if JSON serialization fails.
    pub fn render_status(&self, status: &ServiceStatusOutput) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_status(status);
                Ok(())
            }
            Self::Json(_) => JsonRenderer::render_status(status),
        }
    }

    /// # Errors
    /// Returns an error if JSON serialization fails.
    pub fn render_list(&self, services: &[ServiceStatusOutput]) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_list(services);
                Ok(())
            }
            Self::Json(_) => JsonRenderer::render_list(services),
        }
    }

    /// # Errors
    /// Returns an error if JSON serialization fails.
    pub fn render_batch(&self, operation: BatchOperation, run: &BatchRun) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_batch(operation, run);
                Ok(())
            }
            Self::Json(_) => JsonRenderer::render_batch(operation, run),
        }
    }

    /// # Errors
    /// Returns an error if JSON serialization fails.
    pub fn render_health(&self, report: &HealthReport) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_health(report);
                Ok(())
            }
            Self::Json(_) => JsonRenderer::render_health(report),
        }
    }

    /// # Errors
    /// Returns an error if JSON serialization fails.
    pub fn render_config(&self, config: &TetherConfig, path: &Path) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_config(config, path);
                Ok(())
            }
            Self::Json(_) => JsonRenderer::render_config(config),
        }
    }

    /// # Errors
    /// Returns an error if JSON serialization fails.
    pub fn render_version(&self, version: &str) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_version(version);
                Ok(())
            }
            Self::Json(_) => JsonRenderer::render_version(version),
        }
    }
}
