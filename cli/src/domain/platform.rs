//! Platform capability descriptor.
//!
//! Pure types plus [`PlatformCapability::for_os`], which maps an OS identity
//! and a pair of base directories to the service-manager family and its
//! well-known paths. Host probing lives in `crate::infra::platform`.

use std::fmt;
use std::path::{Path, PathBuf};

/// Host operating-system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformFamily {
    Linux,
    MacOs,
    Windows,
    Unsupported,
}

impl fmt::Display for PlatformFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlatformFamily::Linux => "linux",
            PlatformFamily::MacOs => "macos",
            PlatformFamily::Windows => "windows",
            PlatformFamily::Unsupported => "unsupported",
        })
    }
}

/// Native service manager available on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceManagerKind {
    /// `systemctl --user`
    SystemdUser,
    /// `launchctl` in the per-user GUI domain
    Launchd,
    /// Windows Service Control Manager via `sc.exe`
    Scm,
    None,
}

impl ServiceManagerKind {
    /// Name of the command-line tool used to drive this manager.
    #[must_use]
    pub fn tool(self) -> &'static str {
        match self {
            ServiceManagerKind::SystemdUser => "systemctl",
            ServiceManagerKind::Launchd => "launchctl",
            ServiceManagerKind::Scm => "sc.exe",
            ServiceManagerKind::None => "none",
        }
    }
}

/// Read-only description of the host, created once per process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformCapability {
    pub family: PlatformFamily,
    pub manager: ServiceManagerKind,
    /// Raw OS identifier as probed (e.g. `"linux"`, `"freebsd"`).
    pub os: String,
    /// tether's own configuration directory.
    pub config_dir: PathBuf,
    /// Where service stdout/stderr log files are written, when the manager
    /// does not keep its own journal.
    pub log_dir: PathBuf,
    /// Where native definition artifacts live.
    pub service_dir: PathBuf,
}

impl PlatformCapability {
    /// Build the capability for `os` given the user's home and the platform
    /// configuration base directory (`$XDG_CONFIG_HOME`, `~/Library/Application
    /// Support`, `%APPDATA%`).
    ///
    /// Never fails: an unknown OS yields [`PlatformFamily::Unsupported`].
    #[must_use]
    pub fn for_os(os: &str, home: &Path, config_base: &Path) -> Self {
        let config_dir = config_base.join("tether");
        let (family, manager, log_dir, service_dir) = match os {
            "linux" => (
                PlatformFamily::Linux,
                ServiceManagerKind::SystemdUser,
                config_dir.join("logs"),
                config_base.join("systemd").join("user"),
            ),
            "macos" => (
                PlatformFamily::MacOs,
                ServiceManagerKind::Launchd,
                home.join("Library").join("Logs").join("tether"),
                home.join("Library").join("LaunchAgents"),
            ),
            "windows" => (
                PlatformFamily::Windows,
                ServiceManagerKind::Scm,
                config_dir.join("logs"),
                config_dir.join("services"),
            ),
            _ => (
                PlatformFamily::Unsupported,
                ServiceManagerKind::None,
                config_dir.join("logs"),
                config_dir.join("services"),
            ),
        };
        Self {
            family,
            manager,
            os: os.to_string(),
            config_dir,
            log_dir,
            service_dir,
        }
    }

    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.family != PlatformFamily::Unsupported
    }
}
