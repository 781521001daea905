//! Shared test helpers: a scripted `systemctl`, a throwaway home directory
//! and output constructors.

#![allow(dead_code, clippy::expect_used, clippy::unwrap_used)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use tempfile::TempDir;
use tether_cli::application::ports::CommandRunner;
use tether_cli::application::services::service_start::StartRequest;
use tether_cli::domain::config::TetherConfig;
use tether_cli::domain::definition::DEFAULT_PORT;
use tether_cli::domain::platform::PlatformCapability;
use tether_cli::infra::systemd::SystemdUserDriver;

// ── Cross-platform ExitStatus construction ───────────────────────────────────

/// Build an `ExitStatus` from a logical exit code (0 = success, non-zero = failure).
///
/// On Unix the raw wait-status encodes the exit code in bits 8–15, so we shift.
/// On Windows `ExitStatusExt::from_raw` takes the exit code directly.
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    #[allow(clippy::cast_sign_loss)]
    ExitStatus::from_raw(code as u32)
}

// ── Output constructors ──────────────────────────────────────────────────────

pub fn ok_output(stdout: &str) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(code: i32, stderr: &str) -> Output {
    Output {
        status: exit_status(code),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

// ── Fake systemctl ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Unit {
    active: &'static str,
    enabled: bool,
    pid: u32,
}

#[derive(Default)]
struct SystemctlState {
    units: BTreeMap<String, Unit>,
    calls: Vec<String>,
    failing: BTreeSet<String>,
    next_pid: u32,
}

/// Emulates `systemctl --user` against a real unit directory.
///
/// `daemon-reload` loads every `*.service` file present in `unit_dir` and
/// drops units whose file is gone, like the real manager. Clones share state,
/// so a test can keep one handle while the driver owns another.
#[derive(Clone)]
pub struct FakeSystemctl {
    unit_dir: PathBuf,
    state: Arc<Mutex<SystemctlState>>,
}

impl FakeSystemctl {
    pub fn new(unit_dir: &Path) -> Self {
        Self {
            unit_dir: unit_dir.to_path_buf(),
            state: Arc::new(Mutex::new(SystemctlState {
                next_pid: 1000,
                ..SystemctlState::default()
            })),
        }
    }

    /// Every verb on `unit` exits 1 from now on.
    pub fn fail_unit(&self, unit: &str) {
        self.state.lock().unwrap().failing.insert(unit.to_string());
    }

    /// A running unit the manager knows without a file in `unit_dir`, like a
    /// vendor unit under `/usr/lib/systemd/user`.
    pub fn load_vendor_unit(&self, unit: &str) {
        self.state.lock().unwrap().units.insert(
            unit.to_string(),
            Unit {
                active: "active",
                enabled: true,
                pid: 1,
            },
        );
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Calls that change manager state (everything except `show`).
    pub fn mutating_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| !c.contains(" show "))
            .collect()
    }

    fn handle(&self, args: &[&str]) -> Output {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("systemctl {}", args.join(" ")));

        let verb = args.get(1).copied().unwrap_or_default();
        let unit = args.last().copied().unwrap_or_default().to_string();

        if verb == "daemon-reload" {
            let present: BTreeSet<String> = std::fs::read_dir(&self.unit_dir)
                .map(|rd| {
                    rd.flatten()
                        .map(|e| e.file_name().to_string_lossy().into_owned())
                        .filter(|n| n.ends_with(".service"))
                        .collect()
                })
                .unwrap_or_default();
            state.units.retain(|u, _| present.contains(u));
            for unit in present {
                state.units.entry(unit).or_insert(Unit {
                    active: "inactive",
                    enabled: false,
                    pid: 0,
                });
            }
            return ok_output("");
        }
        if verb == "show" {
            return match state.units.get(&unit) {
                Some(u) => ok_output(&format!(
                    "LoadState=loaded\nActiveState={}\nSubState=x\nUnitFileState={}\nMainPID={}\n",
                    u.active,
                    if u.enabled { "enabled" } else { "disabled" },
                    u.pid
                )),
                None => ok_output("LoadState=not-found\nActiveState=inactive\nMainPID=0\n"),
            };
        }
        if verb == "reset-failed" {
            return ok_output("");
        }
        if state.failing.contains(&unit) {
            return err_output(1, &format!("Job for {unit} failed."));
        }
        let pid = state.next_pid;
        let Some(u) = state.units.get_mut(&unit) else {
            return err_output(5, &format!("Unit {unit} not found."));
        };
        match verb {
            "enable" => u.enabled = true,
            "disable" => u.enabled = false,
            "start" | "restart" => {
                u.active = "active";
                u.pid = pid;
            }
            "stop" => {
                u.active = "inactive";
                u.pid = 0;
            }
            other => return err_output(1, &format!("Unknown command verb {other}.")),
        }
        if matches!(verb, "start" | "restart") {
            state.next_pid += 1;
        }
        ok_output("")
    }
}

impl CommandRunner for FakeSystemctl {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        anyhow::ensure!(program == "systemctl", "unexpected program {program}");
        Ok(self.handle(args))
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> Result<Output> {
        self.run(program, args).await
    }

    async fn run_status(&self, program: &str, _args: &[&str]) -> Result<ExitStatus> {
        anyhow::bail!("run_status not expected in this test: {program}")
    }
}

/// Runner for commands that must never be invoked.
pub struct NoCommands;

impl CommandRunner for NoCommands {
    async fn run(&self, program: &str, _args: &[&str]) -> Result<Output> {
        anyhow::bail!("{program} not expected in this test")
    }

    async fn run_with_timeout(&self, program: &str, _: &[&str], _: Duration) -> Result<Output> {
        anyhow::bail!("{program} not expected in this test")
    }

    async fn run_status(&self, program: &str, _args: &[&str]) -> Result<ExitStatus> {
        anyhow::bail!("{program} not expected in this test")
    }
}

// ── Sandbox ──────────────────────────────────────────────────────────────────

/// A temporary home with a Linux platform capability, a fake runtime and a
/// project directory for entry files.
pub struct Sandbox {
    pub home: TempDir,
    pub platform: PlatformCapability,
    pub config: TetherConfig,
    pub project: PathBuf,
}

impl Sandbox {
    pub fn linux() -> Self {
        let home = TempDir::new().expect("temp dir");
        let config_base = home.path().join(".config");
        let platform = PlatformCapability::for_os("linux", home.path(), &config_base);
        std::fs::create_dir_all(&platform.service_dir).expect("unit dir");

        let bin = home.path().join("bin");
        std::fs::create_dir_all(&bin).expect("bin dir");
        let runtime = bin.join("bun");
        std::fs::write(&runtime, "#!/bin/sh\n").expect("runtime");
        let project = home.path().join("project");
        std::fs::create_dir_all(&project).expect("project dir");

        let config = TetherConfig {
            runtime: runtime.display().to_string(),
            ..TetherConfig::default()
        };
        Self {
            home,
            platform,
            config,
            project,
        }
    }

    /// Write an entry file into the project directory.
    pub fn entry(&self, file_name: &str, content: &str) -> PathBuf {
        let path = self.project.join(file_name);
        std::fs::write(&path, content).expect("entry file");
        path
    }

    pub fn unit_path(&self, name: &str) -> PathBuf {
        self.platform.service_dir.join(format!("{name}.service"))
    }

    /// A systemd driver over a fresh fake, plus a handle on that fake.
    pub fn driver(&self) -> (SystemdUserDriver<FakeSystemctl>, FakeSystemctl) {
        let fake = FakeSystemctl::new(&self.platform.service_dir);
        (
            SystemdUserDriver::new(self.platform.clone(), fake.clone()),
            fake,
        )
    }
}

/// A start request with defaults for everything but the entry.
pub fn start_request(entry: &Path) -> StartRequest {
    StartRequest {
        entry: entry.to_path_buf(),
        name: None,
        port: DEFAULT_PORT,
        env: Vec::new(),
        otel: false,
        prometheus: false,
        build: false,
    }
}

/// An entry file the auditor has nothing to say about.
pub const CLEAN_ENTRY: &str =
    "Bun.serve({ port: Number(process.env.PORT), routes: { '/healthz': new Response('ok') } });\n";
