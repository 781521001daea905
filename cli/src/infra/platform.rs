//! Host platform detection.

use std::path::PathBuf;

use crate::domain::platform::PlatformCapability;

/// Describe the host. Never fails: an unknown OS yields an unsupported
/// capability and the error surfaces from the first lifecycle operation.
#[must_use]
pub fn detect() -> PlatformCapability {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    let config_base = config_base(std::env::consts::OS, &home);
    let capability = PlatformCapability::for_os(std::env::consts::OS, &home, &config_base);
    tracing::debug!(
        family = %capability.family,
        manager = capability.manager.tool(),
        service_dir = %capability.service_dir.display(),
        "platform detected"
    );
    capability
}

/// Base configuration directory. systemd reads user units from
/// `$XDG_CONFIG_HOME/systemd/user`, so Linux follows XDG with the usual
/// fallback to `~/.config`.
fn config_base(os: &str, home: &std::path::Path) -> PathBuf {
    match os {
        "linux" => std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .filter(|p| p.is_absolute())
            .unwrap_or_else(|| home.join(".config")),
        "macos" => home.join("Library").join("Application Support"),
        _ => dirs::config_dir().unwrap_or_else(|| home.join(".config")),
    }
}
