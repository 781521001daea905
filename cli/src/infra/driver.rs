//! Platform driver selection and shared native-command plumbing.
//!
//! One [`ServiceManager`] implementation per platform family, chosen once
//! from the [`PlatformCapability`] by [`PlatformDriver::for_platform`].

use std::process::Output;

use anyhow::Result;

use crate::application::ports::{CommandRunner, ManagerStatus, ServiceManager};
use crate::domain::artifact::NativeArtifact;
use crate::domain::definition::ServiceDefinition;
use crate::domain::error::ServiceError;
use crate::domain::name::ServiceName;
use crate::domain::platform::{PlatformCapability, ServiceManagerKind};
use crate::infra::launchd::LaunchdDriver;
use crate::infra::scm::ScmDriver;
use crate::infra::systemd::SystemdUserDriver;

/// The manager's own explanation of a failed command.
pub(crate) fn failure_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let text = if stderr.trim().is_empty() {
        stdout.trim()
    } else {
        stderr.trim()
    };
    if text.is_empty() {
        match output.status.code() {
            Some(code) => format!("exited with status {code}"),
            None => "terminated by signal".to_string(),
        }
    } else {
        text.to_string()
    }
}

/// Build the typed failure for `service`.
pub(crate) fn manager_failed(
    service: &ServiceName,
    manager: ServiceManagerKind,
    message: impl Into<String>,
) -> ServiceError {
    ServiceError::NativeManagerFailed {
        service: service.to_string(),
        manager: manager.tool(),
        message: message.into(),
    }
}

/// Run a native command and turn a spawn error or non-zero exit into
/// [`ServiceError::NativeManagerFailed`].
pub(crate) async fn run_checked(
    runner: &impl CommandRunner,
    service: &ServiceName,
    manager: ServiceManagerKind,
    args: &[&str],
) -> Result<Output> {
    let output = runner
        .run(manager.tool(), args)
        .await
        .map_err(|e| manager_failed(service, manager, format!("{e:#}")))?;
    if !output.status.success() {
        return Err(manager_failed(service, manager, failure_message(&output)).into());
    }
    Ok(output)
}

/// Stand-in for hosts without a supported manager. Every operation fails
/// with [`ServiceError::UnsupportedPlatform`].
pub struct UnsupportedDriver {
    capability: PlatformCapability,
}

impl UnsupportedDriver {
    #[must_use]
    pub fn new(capability: PlatformCapability) -> Self {
        Self { capability }
    }

    fn unsupported(&self, operation: &'static str) -> anyhow::Error {
        ServiceError::UnsupportedPlatform {
            platform: self.capability.os.clone(),
            operation,
        }
        .into()
    }
}

impl ServiceManager for UnsupportedDriver {
    fn capability(&self) -> &PlatformCapability {
        &self.capability
    }
    async fn status(&self, _name: &ServiceName) -> Result<ManagerStatus> {
        Err(self.unsupported("status"))
    }
    async fn reload(&self, _def: &ServiceDefinition, _artifact: &NativeArtifact) -> Result<()> {
        Err(self.unsupported("reload"))
    }
    async fn enable(&self, _name: &ServiceName) -> Result<()> {
        Err(self.unsupported("enable"))
    }
    async fn disable(&self, _name: &ServiceName) -> Result<()> {
        Err(self.unsupported("disable"))
    }
    async fn start(&self, _name: &ServiceName) -> Result<()> {
        Err(self.unsupported("start"))
    }
    async fn stop(&self, _name: &ServiceName) -> Result<()> {
        Err(self.unsupported("stop"))
    }
    async fn restart(&self, _name: &ServiceName) -> Result<()> {
        Err(self.unsupported("restart"))
    }
    async fn unregister(&self, _name: &ServiceName) -> Result<()> {
        Err(self.unsupported("remove"))
    }
}

/// Enum dispatch over the platform drivers.
pub enum PlatformDriver<R> {
    Systemd(SystemdUserDriver<R>),
    Launchd(LaunchdDriver<R>),
    Scm(ScmDriver<R>),
    Unsupported(UnsupportedDriver),
}

impl<R: CommandRunner> PlatformDriver<R> {
    /// Select the driver for `capability`.
    #[must_use]
    pub fn for_platform(capability: PlatformCapability, runner: R) -> Self {
        match capability.manager {
            ServiceManagerKind::SystemdUser => {
                Self::Systemd(SystemdUserDriver::new(capability, runner))
            }
            ServiceManagerKind::Launchd => Self::Launchd(LaunchdDriver::new(capability, runner)),
            ServiceManagerKind::Scm => Self::Scm(ScmDriver::new(capability, runner)),
            ServiceManagerKind::None => Self::Unsupported(UnsupportedDriver::new(capability)),
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $d:ident => $call:expr) => {
        match $self {
            PlatformDriver::Systemd($d) => $call,
            PlatformDriver::Launchd($d) => $call,
            PlatformDriver::Scm($d) => $call,
            PlatformDriver::Unsupported($d) => $call,
        }
    };
}

impl<R: CommandRunner> ServiceManager for PlatformDriver<R> {
    fn capability(&self) -> &PlatformCapability {
        dispatch!(self, d => d.capability())
    }
    async fn status(&self, name: &ServiceName) -> Result<ManagerStatus> {
        dispatch!(self, d => d.status(name).await)
    }
    async fn reload(&self, def: &ServiceDefinition, artifact: &NativeArtifact) -> Result<()> {
        dispatch!(self, d => d.reload(def, artifact).await)
    }
    async fn enable(&self, name: &ServiceName) -> Result<()> {
        dispatch!(self, d => d.enable(name).await)
    }
    async fn disable(&self, name: &ServiceName) -> Result<()> {
        dispatch!(self, d => d.disable(name).await)
    }
    async fn start(&self, name: &ServiceName) -> Result<()> {
        dispatch!(self, d => d.start(name).await)
    }
    async fn stop(&self, name: &ServiceName) -> Result<()> {
        dispatch!(self, d => d.stop(name).await)
    }
    async fn restart(&self, name: &ServiceName) -> Result<()> {
        dispatch!(self, d => d.restart(name).await)
    }
    async fn unregister(&self, name: &ServiceName) -> Result<()> {
        dispatch!(self, d => d.unregister(name).await)
    }
}
