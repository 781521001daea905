//! Application context: unified state passed to every command handler.
//!
//! Built once in `Cli::run()`. Adding a cross-cutting concern means one
//! field change here and no command signature changes.

use crate::domain::platform::PlatformCapability;
use crate::infra::alert_state::AlertStateFile;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::YamlConfigStore;
use crate::infra::driver::PlatformDriver;
use crate::infra::fs::LocalFs;
use crate::infra::platform;
use crate::infra::prompt::TerminalConfirmer;
use crate::output::{HumanRenderer, JsonRenderer, OutputContext, Renderer};

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Native service manager for the host.
    pub driver: PlatformDriver<TokioCommandRunner>,
    /// Runner for programs outside the service manager (builds, log tails).
    pub runner: TokioCommandRunner,
    pub fs: LocalFs,
    pub confirmer: TerminalConfirmer,
    pub config_store: YamlConfigStore,
    pub alert_state: AlertStateFile,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags and the host.
    #[must_use]
    pub fn new(flags: &AppFlags) -> Self {
        let capability = platform::detect();
        let mode = if flags.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        Self {
            output: OutputContext::new(flags.no_color, flags.quiet),
            mode,
            config_store: YamlConfigStore::new(&capability.config_dir),
            alert_state: AlertStateFile::in_dir(&capability.config_dir),
            driver: PlatformDriver::for_platform(capability, TokioCommandRunner::default()),
            runner: TokioCommandRunner::default(),
            fs: LocalFs,
            confirmer: TerminalConfirmer::from_env(),
        }
    }

    /// Host capability the driver was built for.
    #[must_use]
    pub fn platform(&self) -> &PlatformCapability {
        use crate::application::ports::ServiceManager as _;
        self.driver.capability()
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Returns the appropriate `Renderer` variant for the current output mode.
    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json(JsonRenderer),
        }
    }
}
