//! Application service: service start use-case.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.
//!
//! Steps run strictly in order: validate, audit, build, generate, write,
//! reload, enable, start. Validation and audit failures leave no trace.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tether_common::{ServiceEndpoints, ServiceState};

use crate::application::ports::{CommandRunner, LocalFs, ProgressReporter, ServiceManager};
use crate::application::services::service_control::{
    FOREIGN_DEFINITION, FOREIGN_SERVICE, ownership,
};
use crate::domain::artifact::{self, NativeArtifact};
use crate::domain::audit::{AuditFinding, audit_source};
use crate::domain::config::TetherConfig;
use crate::domain::definition::{
    ObservabilityFlags, RestartPolicy, ServiceDefinition, effective_port, parse_env_pair,
};
use crate::domain::error::ServiceError;
use crate::domain::name::{ServiceName, qualify, validate};
use crate::domain::platform::PlatformFamily;

/// Upper bound for `<runtime> build --compile`.
const BUILD_TIMEOUT: Duration = Duration::from_secs(300);

/// Directory next to the entry file holding compiled binaries.
pub const BUILD_DIR: &str = ".tether";

/// Parsed `tether start` arguments.
#[derive(Debug, Clone)]
pub struct StartRequest {
    pub entry: PathBuf,
    pub name: Option<String>,
    pub port: u16,
    /// Raw `KEY=VALUE` entries in command-line order.
    pub env: Vec<String>,
    pub otel: bool,
    pub prometheus: bool,
    pub build: bool,
}

/// What `start` did to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// First start: definition written, registered, enabled and started.
    Created,
    /// Existing stopped service started with an unchanged definition.
    Started,
    /// Definition changed: rewritten, reloaded and (re)started.
    Updated,
    /// Already running with an identical definition. Nothing changed.
    AlreadyRunning,
}

/// Everything the start command reports back.
#[derive(Debug, Clone)]
pub struct StartReport {
    pub name: ServiceName,
    pub qualified_name: String,
    pub outcome: StartOutcome,
    pub artifact_path: PathBuf,
    pub port: u16,
    pub endpoints: ServiceEndpoints,
    pub warnings: Vec<AuditFinding>,
    pub overridden_env: Vec<String>,
}

/// Start a service, creating it if needed.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidName`] / [`ServiceError::InvalidEnv`] before
/// any side effect, [`ServiceError::AuditRejected`] before the definition is
/// written, [`ServiceError::DefinitionWriteFailed`] when the artifact cannot
/// be written, and whatever the manager raises for the native calls.
pub async fn start_service(
    manager: &impl ServiceManager,
    fs: &impl LocalFs,
    runner: &impl CommandRunner,
    reporter: &impl ProgressReporter,
    config: &TetherConfig,
    request: &StartRequest,
) -> Result<StartReport> {
    let name = resolve_name(request)?;
    let environment = request
        .env
        .iter()
        .map(|entry| parse_env_pair(entry))
        .collect::<Result<Vec<_>, _>>()?;
    let port = effective_port(request.port, &environment)?;

    if !fs.is_file(&request.entry) {
        bail!("Entry file not found: {}", request.entry.display());
    }
    let entry = fs.canonicalize(&request.entry)?;

    reporter.step("auditing entry file...");
    let content = fs.read_to_string(&entry)?;
    let report = audit_source(&content, fs.mode(&entry)?);
    if report.is_blocked() {
        return Err(ServiceError::AuditRejected {
            path: entry.display().to_string(),
            findings: report.critical_messages(),
        }
        .into());
    }
    for finding in &report.warning {
        tracing::warn!(service = %name, "audit warning: {finding}");
        reporter.warn(&format!("audit: {finding}"));
    }

    let platform = manager.capability();
    if !platform.is_supported() {
        return Err(ServiceError::UnsupportedPlatform {
            platform: platform.os.clone(),
            operation: "start",
        }
        .into());
    }

    let working_directory = entry
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let runtime = fs.find_executable(&config.runtime).with_context(|| {
        format!(
            "Runtime '{}' not found on PATH. Install it or run: tether config set runtime <path>",
            config.runtime
        )
    })?;

    let (executable, arguments) = if request.build {
        reporter.step("compiling entry file...");
        let binary = build_binary(runner, &runtime, &entry, &working_directory, &name, platform.family)
            .await?;
        (binary, Vec::new())
    } else {
        (
            runtime,
            vec!["run".to_string(), entry.display().to_string()],
        )
    };

    let definition = ServiceDefinition {
        name: name.clone(),
        executable,
        arguments,
        working_directory,
        port: request.port,
        environment,
        restart: RestartPolicy::FIXED,
        observability: ObservabilityFlags {
            otel: request.otel,
            prometheus: request.prometheus,
        },
        otel_endpoint: config.otel.endpoint.clone(),
    };
    let artifact = artifact::generate(&definition, platform)?;
    for key in &artifact.overridden_env {
        tracing::warn!(service = %name, key = %key, "environment variable overridden");
        reporter.warn(&format!("{key} set more than once; the last value wins"));
    }

    let outcome = apply(manager, fs, reporter, &definition, &artifact).await?;

    Ok(StartReport {
        qualified_name: qualify(&name, platform.family),
        name,
        outcome,
        artifact_path: artifact.path,
        port,
        endpoints: ServiceEndpoints::for_port(port),
        warnings: report.warning,
        overridden_env: artifact.overridden_env,
    })
}

/// `--name`, or the entry file stem.
fn resolve_name(request: &StartRequest) -> Result<ServiceName, ServiceError> {
    let raw = match &request.name {
        Some(name) => name.clone(),
        None => request
            .entry
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    validate(&raw)
}

async fn build_binary(
    runner: &impl CommandRunner,
    runtime: &Path,
    entry: &Path,
    working_directory: &Path,
    name: &ServiceName,
    family: PlatformFamily,
) -> Result<PathBuf> {
    let file_name = if family == PlatformFamily::Windows {
        format!("{name}.exe")
    } else {
        name.to_string()
    };
    let binary = working_directory.join(BUILD_DIR).join(file_name);
    let runtime = runtime.display().to_string();
    let entry = entry.display().to_string();
    let outfile = binary.display().to_string();
    tracing::debug!(%runtime, %entry, %outfile, "compiling");
    let output = runner
        .run_with_timeout(
            &runtime,
            &["build", &entry, "--compile", "--outfile", &outfile],
            BUILD_TIMEOUT,
        )
        .await
        .context("failed to run the build")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("Build failed for {entry}: {}", stderr.trim());
    }
    Ok(binary)
}

/// Bring the native manager in line with `artifact`.
async fn apply(
    manager: &impl ServiceManager,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
    definition: &ServiceDefinition,
    artifact: &NativeArtifact,
) -> Result<StartOutcome> {
    let name = &definition.name;
    let owned = ownership(fs, &artifact.path)?;
    let status = manager.status(name).await?;
    let refuse = |reason| ServiceError::NotManaged {
        service: name.to_string(),
        reason,
    };
    match owned {
        Some(false) => return Err(refuse(FOREIGN_DEFINITION).into()),
        // Writing our file would shadow a unit defined elsewhere.
        None if status.state != ServiceState::NotFound => {
            return Err(refuse(FOREIGN_SERVICE).into());
        }
        _ => {}
    }

    if status.state == ServiceState::NotFound {
        reporter.step("writing service definition...");
        write_artifact(fs, artifact)?;
        manager.reload(definition, artifact).await?;
        manager.enable(name).await?;
        reporter.step("starting service...");
        manager.start(name).await?;
        tracing::info!(service = %name, "service created");
        return Ok(StartOutcome::Created);
    }

    let on_disk = fs.read_to_string(&artifact.path).ok();
    let changed = on_disk.as_deref().map(artifact::digest) != Some(artifact.digest());
    if changed {
        reporter.step("updating service definition...");
        write_artifact(fs, artifact)?;
        manager.reload(definition, artifact).await?;
    }

    if status.is_active() {
        if !changed {
            return Ok(StartOutcome::AlreadyRunning);
        }
        reporter.step("restarting service...");
        manager.restart(name).await?;
        tracing::info!(service = %name, "service updated");
        return Ok(StartOutcome::Updated);
    }

    if !status.enabled {
        manager.enable(name).await?;
    }
    reporter.step("starting service...");
    manager.start(name).await?;
    tracing::info!(service = %name, "service started");
    Ok(if changed {
        StartOutcome::Updated
    } else {
        StartOutcome::Started
    })
}

/// Write the definition and make sure its log directory exists; launchd
/// does not create missing parents of `StandardOutPath`.
fn write_artifact(fs: &impl LocalFs, artifact: &NativeArtifact) -> Result<(), ServiceError> {
    let failed = |path: &Path, e: anyhow::Error| ServiceError::DefinitionWriteFailed {
        path: path.display().to_string(),
        message: format!("{e:#}"),
    };
    for dir in artifact.log_files.iter().filter_map(|log| log.parent()) {
        fs.create_dir_all(dir).map_err(|e| failed(dir, e))?;
    }
    fs.write_atomic(&artifact.path, &artifact.content)
        .map_err(|e| failed(&artifact.path, e))
}
