//! systemd user-mode driver (`systemctl --user`).

use anyhow::Result;
use tether_common::ServiceState;

use crate::application::ports::{CommandRunner, ManagerStatus, ServiceManager};
use crate::domain::artifact::NativeArtifact;
use crate::domain::definition::ServiceDefinition;
use crate::domain::name::{ServiceName, qualify};
use crate::domain::platform::{PlatformCapability, ServiceManagerKind};
use crate::infra::driver::run_checked;

const MANAGER: ServiceManagerKind = ServiceManagerKind::SystemdUser;

/// Drives user units through `systemctl --user`. Unit names always follow
/// `--` so a name can never be read as an option.
pub struct SystemdUserDriver<R> {
    capability: PlatformCapability,
    runner: R,
}

impl<R: CommandRunner> SystemdUserDriver<R> {
    #[must_use]
    pub fn new(capability: PlatformCapability, runner: R) -> Self {
        Self { capability, runner }
    }

    fn unit(&self, name: &ServiceName) -> String {
        format!("{}.service", qualify(name, self.capability.family))
    }

    async fn systemctl(&self, name: &ServiceName, verb: &str) -> Result<()> {
        let unit = self.unit(name);
        run_checked(&self.runner, name, MANAGER, &["--user", verb, "--", &unit]).await?;
        Ok(())
    }

    async fn daemon_reload(&self, name: &ServiceName) -> Result<()> {
        run_checked(&self.runner, name, MANAGER, &["--user", "daemon-reload"]).await?;
        Ok(())
    }
}

/// Parse `systemctl show` output into a status.
#[must_use]
pub fn parse_show(stdout: &str) -> ManagerStatus {
    let mut load_state = "";
    let mut active_state = "";
    let mut unit_file_state = "";
    let mut pid = None;
    for line in stdout.lines() {
        if let Some((key, value)) = line.split_once('=') {
            match key {
                "LoadState" => load_state = value,
                "ActiveState" => active_state = value,
                "UnitFileState" => unit_file_state = value,
                "MainPID" => pid = value.parse().ok().filter(|p| *p != 0),
                _ => {}
            }
        }
    }
    if load_state == "not-found" || load_state.is_empty() {
        return ManagerStatus::not_found();
    }
    let state = match active_state {
        "active" | "reloading" => ServiceState::Running,
        "activating" => ServiceState::Starting,
        "failed" => ServiceState::Failed,
        "inactive" | "deactivating" => ServiceState::Stopped,
        _ => ServiceState::Installed,
    };
    ManagerStatus {
        state,
        enabled: unit_file_state == "enabled",
        pid: if state == ServiceState::Running { pid } else { None },
    }
}

impl<R: CommandRunner> ServiceManager for SystemdUserDriver<R> {
    fn capability(&self) -> &PlatformCapability {
        &self.capability
    }

    async fn status(&self, name: &ServiceName) -> Result<ManagerStatus> {
        let unit = self.unit(name);
        let output = run_checked(
            &self.runner,
            name,
            MANAGER,
            &[
                "--user",
                "show",
                "--property=LoadState,ActiveState,SubState,UnitFileState,MainPID",
                "--",
                &unit,
            ],
        )
        .await?;
        Ok(parse_show(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn reload(&self, definition: &ServiceDefinition, _artifact: &NativeArtifact) -> Result<()> {
        self.daemon_reload(&definition.name).await
    }

    async fn enable(&self, name: &ServiceName) -> Result<()> {
        self.systemctl(name, "enable").await
    }

    async fn disable(&self, name: &ServiceName) -> Result<()> {
        self.systemctl(name, "disable").await
    }

    async fn start(&self, name: &ServiceName) -> Result<()> {
        self.systemctl(name, "start").await
    }

    async fn stop(&self, name: &ServiceName) -> Result<()> {
        self.systemctl(name, "stop").await
    }

    async fn restart(&self, name: &ServiceName) -> Result<()> {
        self.systemctl(name, "restart").await
    }

    async fn unregister(&self, name: &ServiceName) -> Result<()> {
        self.daemon_reload(name).await?;
        // Only clears a leftover failed state; nothing to report if absent.
        let unit = self.unit(name);
        let _ = self
            .runner
            .run("systemctl", &["--user", "reset-failed", "--", &unit])
            .await;
        Ok(())
    }
}
