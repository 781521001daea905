//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and shared wire types, never
//! from `crate::infra`, `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::time::Duration;

use anyhow::Result;
use tether_common::{AlertPayload, ServiceState};

use crate::domain::alert::AlertState;
use crate::domain::artifact::NativeArtifact;
use crate::domain::config::TetherConfig;
use crate::domain::definition::ServiceDefinition;
use crate::domain::name::ServiceName;
use crate::domain::platform::PlatformCapability;

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
    /// Run a program with inherited stdio and return only its exit status.
    async fn run_status(&self, program: &str, args: &[&str]) -> Result<ExitStatus>;
}

// ── Filesystem Port ───────────────────────────────────────────────────────────

/// Abstracts local filesystem access. Sync trait; every call is a short,
/// local operation.
pub trait LocalFs {
    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    /// Resolve `path` to an absolute path with symlinks followed.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    /// Unix permission bits, or `None` where the platform has none.
    fn mode(&self, path: &Path) -> Result<Option<u32>>;
    /// Create `dir` and any missing parents.
    fn create_dir_all(&self, dir: &Path) -> Result<()>;
    /// Write `content` atomically, creating parent directories.
    fn write_atomic(&self, path: &Path, content: &str) -> Result<()>;
    /// Remove a file. A missing file is not an error.
    fn remove_file(&self, path: &Path) -> Result<()>;
    /// Regular files directly inside `dir`. A missing directory is empty.
    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>>;
    /// Look `program` up on `PATH` (or accept it if it is already a path).
    fn find_executable(&self, program: &str) -> Option<PathBuf>;
}

// ── Service Manager Port ──────────────────────────────────────────────────────

/// What the native manager reports for one service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerStatus {
    pub state: ServiceState,
    pub enabled: bool,
    pub pid: Option<u32>,
}

impl ManagerStatus {
    #[must_use]
    pub fn not_found() -> Self {
        Self {
            state: ServiceState::NotFound,
            enabled: false,
            pid: None,
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.state, ServiceState::Running | ServiceState::Starting)
    }
}

/// Lifecycle operations in the native manager's vocabulary.
///
/// One implementation per platform family. Every failure of the native tool
/// surfaces as [`crate::domain::error::ServiceError::NativeManagerFailed`].
/// Implementations never retry.
#[allow(async_fn_in_trait)]
pub trait ServiceManager {
    fn capability(&self) -> &PlatformCapability;
    /// Query the live state. Never cached.
    async fn status(&self, name: &ServiceName) -> Result<ManagerStatus>;
    /// Make the manager pick up a freshly written or changed artifact.
    async fn reload(&self, definition: &ServiceDefinition, artifact: &NativeArtifact)
    -> Result<()>;
    async fn enable(&self, name: &ServiceName) -> Result<()>;
    async fn disable(&self, name: &ServiceName) -> Result<()>;
    async fn start(&self, name: &ServiceName) -> Result<()>;
    async fn stop(&self, name: &ServiceName) -> Result<()>;
    async fn restart(&self, name: &ServiceName) -> Result<()>;
    /// Forget the service after its artifact has been deleted.
    async fn unregister(&self, name: &ServiceName) -> Result<()>;
}

// ── Interaction Ports ─────────────────────────────────────────────────────────

/// Asks the user a yes/no question.
pub trait Confirmer {
    /// Returns `default` without asking when no terminal is attached.
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;
}

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Health and Alert Ports ────────────────────────────────────────────────────

/// Result of one health probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub healthy: bool,
    pub status_code: Option<u16>,
    pub message: String,
}

/// Probes a service's health endpoint.
#[allow(async_fn_in_trait)]
pub trait HealthProbe {
    /// Transport failures are reported as an unhealthy [`ProbeResult`], not
    /// as `Err`.
    async fn probe(&self, url: &str) -> ProbeResult;
}

/// Delivers alerts to an external collaborator.
#[allow(async_fn_in_trait)]
pub trait AlertSink {
    async fn send(&self, webhook: &str, payload: &AlertPayload) -> Result<()>;
}

// ── State and Config Ports ────────────────────────────────────────────────────

/// Persists the alert cooldown map.
pub trait AlertStateStore {
    /// Load the state; a missing file yields an empty state.
    fn load(&self) -> Result<AlertState>;
    fn save(&self, state: &AlertState) -> Result<()>;
}

/// Abstracts configuration persistence.
pub trait ConfigStore {
    /// Load configuration; a missing file yields defaults.
    fn load(&self) -> Result<TetherConfig>;
    fn save(&self, config: &TetherConfig) -> Result<()>;
    fn path(&self) -> &Path;
}
