//! launchd driver for per-user agents (`launchctl` in the `gui/<uid>` domain).

use std::path::PathBuf;

use anyhow::Result;
use tether_common::ServiceState;
use tokio::sync::OnceCell;

use crate::application::ports::{CommandRunner, ManagerStatus, ServiceManager};
use crate::domain::artifact::{NativeArtifact, artifact_path};
use crate::domain::definition::ServiceDefinition;
use crate::domain::error::ServiceError;
use crate::domain::name::{ServiceName, qualify};
use crate::domain::platform::{PlatformCapability, ServiceManagerKind};
use crate::infra::driver::{failure_message, manager_failed, run_checked};

const MANAGER: ServiceManagerKind = ServiceManagerKind::Launchd;

/// Drives launch agents with the modern `bootstrap`/`bootout`/`kickstart`
/// verbs. `stop` boots the agent out, since `KeepAlive` would otherwise
/// respawn a killed process; the plist stays in `~/Library/LaunchAgents`.
pub struct LaunchdDriver<R> {
    capability: PlatformCapability,
    runner: R,
    uid: OnceCell<String>,
}

impl<R: CommandRunner> LaunchdDriver<R> {
    #[must_use]
    pub fn new(capability: PlatformCapability, runner: R) -> Self {
        Self {
            capability,
            runner,
            uid: OnceCell::new(),
        }
    }

    async fn domain(&self, name: &ServiceName) -> Result<String> {
        let uid = self
            .uid
            .get_or_try_init(|| async {
                let output = self
                    .runner
                    .run("id", &["-u"])
                    .await
                    .map_err(|e| manager_failed(name, MANAGER, format!("cannot determine uid: {e:#}")))?;
                if !output.status.success() {
                    return Err(manager_failed(
                        name,
                        MANAGER,
                        format!("cannot determine uid: {}", failure_message(&output)),
                    ));
                }
                Ok::<_, ServiceError>(String::from_utf8_lossy(&output.stdout).trim().to_string())
            })
            .await?;
        Ok(format!("gui/{uid}"))
    }

    async fn target(&self, name: &ServiceName) -> Result<String> {
        Ok(format!(
            "{}/{}",
            self.domain(name).await?,
            qualify(name, self.capability.family)
        ))
    }

    fn plist(&self, name: &ServiceName) -> PathBuf {
        artifact_path(name, &self.capability)
            .unwrap_or_else(|| self.capability.service_dir.join(name.as_str()))
    }

    /// `launchctl print` output when the agent is loaded, `None` otherwise.
    async fn print(&self, name: &ServiceName) -> Result<Option<String>> {
        let target = self.target(name).await?;
        let output = self
            .runner
            .run(MANAGER.tool(), &["print", &target])
            .await
            .map_err(|e| manager_failed(name, MANAGER, format!("{e:#}")))?;
        Ok(output
            .status
            .success()
            .then(|| String::from_utf8_lossy(&output.stdout).into_owned()))
    }

    async fn bootstrap(&self, name: &ServiceName) -> Result<()> {
        let domain = self.domain(name).await?;
        let plist = self.plist(name).display().to_string();
        run_checked(&self.runner, name, MANAGER, &["bootstrap", &domain, &plist]).await?;
        Ok(())
    }

    async fn bootout(&self, name: &ServiceName) -> Result<()> {
        let target = self.target(name).await?;
        run_checked(&self.runner, name, MANAGER, &["bootout", &target]).await?;
        Ok(())
    }

    async fn is_enabled(&self, name: &ServiceName) -> Result<bool> {
        let domain = self.domain(name).await?;
        let output = run_checked(&self.runner, name, MANAGER, &["print-disabled", &domain]).await?;
        let label = qualify(name, self.capability.family);
        Ok(!is_disabled(&String::from_utf8_lossy(&output.stdout), &label))
    }
}

/// Whether `print-disabled` lists `label` as disabled. Older releases print
/// `=> true` for disabled agents, newer ones `=> disabled`.
#[must_use]
pub fn is_disabled(print_disabled: &str, label: &str) -> bool {
    let quoted = format!("\"{label}\"");
    print_disabled.lines().any(|line| {
        let line = line.trim();
        line.starts_with(&quoted)
            && line
                .split("=>")
                .nth(1)
                .is_some_and(|v| matches!(v.trim(), "true" | "disabled"))
    })
}

/// Parse the `state` and `pid` fields of `launchctl print`.
#[must_use]
pub fn parse_print(stdout: &str) -> (ServiceState, Option<u32>) {
    let mut state = ServiceState::Installed;
    let mut pid = None;
    for line in stdout.lines() {
        let Some((key, value)) = line.trim().split_once(" = ") else {
            continue;
        };
        match key {
            "state" => {
                state = match value.trim() {
                    "running" => ServiceState::Running,
                    "spawn scheduled" | "xpcproxy" => ServiceState::Starting,
                    "not running" | "exited" => ServiceState::Stopped,
                    _ => ServiceState::Installed,
                };
            }
            "pid" => pid = value.trim().parse().ok(),
            _ => {}
        }
    }
    (state, pid)
}

impl<R: CommandRunner> ServiceManager for LaunchdDriver<R> {
    fn capability(&self) -> &PlatformCapability {
        &self.capability
    }

    async fn status(&self, name: &ServiceName) -> Result<ManagerStatus> {
        let enabled = self.is_enabled(name).await?;
        match self.print(name).await? {
            Some(stdout) => {
                let (state, pid) = parse_print(&stdout);
                Ok(ManagerStatus {
                    state,
                    enabled,
                    pid: if state == ServiceState::Running { pid } else { None },
                })
            }
            // Booted out but still installed.
            None if self.plist(name).exists() => Ok(ManagerStatus {
                state: ServiceState::Stopped,
                enabled,
                pid: None,
            }),
            None => Ok(ManagerStatus::not_found()),
        }
    }

    async fn reload(&self, definition: &ServiceDefinition, _artifact: &NativeArtifact) -> Result<()> {
        let name = &definition.name;
        if self.print(name).await?.is_some() {
            self.bootout(name).await?;
        }
        // launchd refuses to bootstrap a label with a disabled override.
        self.enable(name).await?;
        self.bootstrap(name).await
    }

    async fn enable(&self, name: &ServiceName) -> Result<()> {
        let target = self.target(name).await?;
        run_checked(&self.runner, name, MANAGER, &["enable", &target]).await?;
        Ok(())
    }

    async fn disable(&self, name: &ServiceName) -> Result<()> {
        let target = self.target(name).await?;
        run_checked(&self.runner, name, MANAGER, &["disable", &target]).await?;
        Ok(())
    }

    async fn start(&self, name: &ServiceName) -> Result<()> {
        if self.print(name).await?.is_none() {
            self.bootstrap(name).await?;
        }
        let target = self.target(name).await?;
        run_checked(&self.runner, name, MANAGER, &["kickstart", &target]).await?;
        Ok(())
    }

    async fn stop(&self, name: &ServiceName) -> Result<()> {
        self.bootout(name).await
    }

    async fn restart(&self, name: &ServiceName) -> Result<()> {
        let target = self.target(name).await?;
        if self.print(name).await?.is_none() {
            self.bootstrap(name).await?;
            run_checked(&self.runner, name, MANAGER, &["kickstart", &target]).await?;
        } else {
            run_checked(&self.runner, name, MANAGER, &["kickstart", "-k", &target]).await?;
        }
        Ok(())
    }

    /// Boot the agent out and drop the disabled override `remove` left
    /// behind, which launchd keeps after the plist is gone.
    async fn unregister(&self, name: &ServiceName) -> Result<()> {
        if self.print(name).await?.is_some() {
            self.bootout(name).await?;
        }
        self.enable(name).await
    }
}
