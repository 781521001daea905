//! Windows Service Control Manager driver (`sc.exe`).
//!
//! SCM has no atomic restart, so `restart` is stop-then-start. Either half
//! failing fails the restart; a failed start after a successful stop leaves
//! the service stopped and says so. `stop` waits at most the fixed stop
//! timeout for the service to reach `STOPPED`.

use std::process::Output;
use std::time::Duration;

use anyhow::{Context, Result};
use tether_common::ServiceState;

use crate::application::ports::{CommandRunner, ManagerStatus, ServiceManager};
use crate::domain::artifact::{NativeArtifact, scm_bin_path, scm_environment};
use crate::domain::definition::{RestartPolicy, ServiceDefinition};
use crate::domain::name::{ServiceName, qualify};
use crate::domain::platform::{PlatformCapability, ServiceManagerKind};
use crate::infra::driver::{failure_message, manager_failed, run_checked};

const MANAGER: ServiceManagerKind = ServiceManagerKind::Scm;

/// ERROR_SERVICE_DOES_NOT_EXIST
const ERROR_SERVICE_DOES_NOT_EXIST: i32 = 1060;
/// ERROR_SERVICE_NOT_ACTIVE
const ERROR_SERVICE_NOT_ACTIVE: i32 = 1062;
/// ERROR_SERVICE_ALREADY_RUNNING
const ERROR_SERVICE_ALREADY_RUNNING: i32 = 1056;

const STOP_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct ScmDriver<R> {
    capability: PlatformCapability,
    runner: R,
}

/// `true` when `output` failed with the Win32 error `code`. `sc.exe` reports
/// it both as its exit code and in the message text.
fn failed_with(output: &Output, code: i32) -> bool {
    !output.status.success()
        && (output.status.code() == Some(code)
            || String::from_utf8_lossy(&output.stdout).contains(&code.to_string()))
}

/// Parse `STATE` and `PID` from `sc queryex`.
#[must_use]
pub fn parse_query(stdout: &str) -> (ServiceState, Option<u32>) {
    let mut state = ServiceState::Installed;
    let mut pid = None;
    for line in stdout.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        match key.trim() {
            "STATE" => {
                state = match value.split_whitespace().nth(1) {
                    Some("RUNNING") => ServiceState::Running,
                    Some("START_PENDING" | "CONTINUE_PENDING") => ServiceState::Starting,
                    Some("STOPPED" | "STOP_PENDING" | "PAUSED" | "PAUSE_PENDING") => {
                        ServiceState::Stopped
                    }
                    _ => ServiceState::Installed,
                };
            }
            "PID" => pid = value.trim().parse().ok().filter(|p| *p != 0),
            _ => {}
        }
    }
    (state, pid)
}

/// Whether `sc qc` reports an automatic start type.
#[must_use]
pub fn parse_auto_start(stdout: &str) -> bool {
    stdout
        .lines()
        .any(|line| line.trim_start().starts_with("START_TYPE") && line.contains("AUTO_START"))
}

impl<R: CommandRunner> ScmDriver<R> {
    #[must_use]
    pub fn new(capability: PlatformCapability, runner: R) -> Self {
        Self { capability, runner }
    }

    fn service(&self, name: &ServiceName) -> String {
        qualify(name, self.capability.family)
    }

    async fn sc(&self, name: &ServiceName, args: &[&str]) -> Result<Output> {
        self.runner
            .run(MANAGER.tool(), args)
            .await
            .map_err(|e| manager_failed(name, MANAGER, format!("{e:#}")).into())
    }

    async fn exists(&self, name: &ServiceName) -> Result<bool> {
        let service = self.service(name);
        let output = self.sc(name, &["query", &service]).await?;
        if failed_with(&output, ERROR_SERVICE_DOES_NOT_EXIST) {
            return Ok(false);
        }
        if !output.status.success() {
            return Err(manager_failed(name, MANAGER, failure_message(&output)).into());
        }
        Ok(true)
    }

    async fn wait_stopped(&self, name: &ServiceName) -> Result<()> {
        let service = self.service(name);
        let timeout = Duration::from_secs(u64::from(RestartPolicy::FIXED.stop_timeout_secs));
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let output = self.sc(name, &["query", &service]).await?;
            if parse_query(&String::from_utf8_lossy(&output.stdout)).0 == ServiceState::Stopped {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(manager_failed(
                    name,
                    MANAGER,
                    format!("service did not stop within {}s", timeout.as_secs()),
                )
                .into());
            }
            tokio::time::sleep(STOP_POLL_INTERVAL).await;
        }
    }

    async fn set_environment(&self, name: &ServiceName, vars: &[String]) -> Result<()> {
        let key = format!(
            "HKLM\\SYSTEM\\CurrentControlSet\\Services\\{}",
            self.service(name)
        );
        let data = vars.join("\\0");
        let output = self
            .runner
            .run(
                "reg",
                &["add", &key, "/v", "Environment", "/t", "REG_MULTI_SZ", "/d", &data, "/f"],
            )
            .await
            .map_err(|e| manager_failed(name, MANAGER, format!("{e:#}")))?;
        if !output.status.success() {
            return Err(manager_failed(
                name,
                MANAGER,
                format!("setting environment failed: {}", failure_message(&output)),
            )
            .into());
        }
        Ok(())
    }
}

impl<R: CommandRunner> ServiceManager for ScmDriver<R> {
    fn capability(&self) -> &PlatformCapability {
        &self.capability
    }

    async fn status(&self, name: &ServiceName) -> Result<ManagerStatus> {
        let service = self.service(name);
        let output = self.sc(name, &["queryex", &service]).await?;
        if failed_with(&output, ERROR_SERVICE_DOES_NOT_EXIST) {
            return Ok(ManagerStatus::not_found());
        }
        if !output.status.success() {
            return Err(manager_failed(name, MANAGER, failure_message(&output)).into());
        }
        let (state, pid) = parse_query(&String::from_utf8_lossy(&output.stdout));
        let config = run_checked(&self.runner, name, MANAGER, &["qc", &service]).await?;
        Ok(ManagerStatus {
            state,
            enabled: parse_auto_start(&String::from_utf8_lossy(&config.stdout)),
            pid: if state == ServiceState::Running { pid } else { None },
        })
    }

    async fn reload(&self, definition: &ServiceDefinition, artifact: &NativeArtifact) -> Result<()> {
        let name = &definition.name;
        let service = self.service(name);
        let bin_path = scm_bin_path(&artifact.content)
            .ok_or_else(|| manager_failed(name, MANAGER, "registration record has no bin_path"))?;
        if self.exists(name).await? {
            run_checked(
                &self.runner,
                name,
                MANAGER,
                &["config", &service, "binPath=", bin_path, "start=", "auto"],
            )
            .await?;
        } else {
            let display = format!("tether {name}");
            run_checked(
                &self.runner,
                name,
                MANAGER,
                &[
                    "create",
                    &service,
                    "binPath=",
                    bin_path,
                    "start=",
                    "auto",
                    "DisplayName=",
                    &display,
                ],
            )
            .await?;
        }

        let delay_ms = (definition.restart.restart_delay_secs * 1000).to_string();
        let actions = format!("restart/{delay_ms}/restart/{delay_ms}/restart/{delay_ms}");
        run_checked(
            &self.runner,
            name,
            MANAGER,
            &["failure", &service, "reset=", "86400", "actions=", &actions],
        )
        .await?;

        self.set_environment(name, &scm_environment(&artifact.content))
            .await
    }

    async fn enable(&self, name: &ServiceName) -> Result<()> {
        let service = self.service(name);
        run_checked(&self.runner, name, MANAGER, &["config", &service, "start=", "auto"]).await?;
        Ok(())
    }

    async fn disable(&self, name: &ServiceName) -> Result<()> {
        let service = self.service(name);
        run_checked(&self.runner, name, MANAGER, &["config", &service, "start=", "disabled"])
            .await?;
        Ok(())
    }

    async fn start(&self, name: &ServiceName) -> Result<()> {
        let service = self.service(name);
        let output = self.sc(name, &["start", &service]).await?;
        if output.status.success() || failed_with(&output, ERROR_SERVICE_ALREADY_RUNNING) {
            return Ok(());
        }
        Err(manager_failed(name, MANAGER, failure_message(&output)).into())
    }

    async fn stop(&self, name: &ServiceName) -> Result<()> {
        let service = self.service(name);
        let output = self.sc(name, &["stop", &service]).await?;
        if failed_with(&output, ERROR_SERVICE_NOT_ACTIVE) {
            return Ok(());
        }
        if !output.status.success() {
            return Err(manager_failed(name, MANAGER, failure_message(&output)).into());
        }
        self.wait_stopped(name).await
    }

    async fn restart(&self, name: &ServiceName) -> Result<()> {
        self.stop(name)
            .await
            .with_context(|| format!("restart of service '{name}' failed while stopping"))?;
        if let Err(e) = self.start(name).await {
            tracing::warn!(service = %name, "restart left the service stopped");
            return Err(e.context(format!(
                "restart of service '{name}' stopped it, but start failed; the service is now stopped"
            )));
        }
        Ok(())
    }

    async fn unregister(&self, name: &ServiceName) -> Result<()> {
        let service = self.service(name);
        let output = self.sc(name, &["delete", &service]).await?;
        if output.status.success() || failed_with(&output, ERROR_SERVICE_DOES_NOT_EXIST) {
            return Ok(());
        }
        Err(manager_failed(name, MANAGER, failure_message(&output)).into())
    }
}
