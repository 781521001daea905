//! Native definition artifact generation: pure functions, no I/O, no async.
//!
//! Each generator takes a [`ServiceDefinition`] and returns the artifact text.
//! Output is a function of the definition alone (no timestamps, no hash-map
//! iteration), so regenerating an unchanged definition is byte-identical and
//! re-running `start` is safe. The caller is responsible for writing to disk.

#![allow(clippy::format_push_string)]

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::domain::definition::{ResolvedEnvironment, ServiceDefinition};
use crate::domain::error::ServiceError;
use crate::domain::logs::log_files;
use crate::domain::name::{ServiceName, qualify};
use crate::domain::platform::{PlatformCapability, PlatformFamily};

/// First-line marker identifying artifacts owned by tether.
pub const MANAGED_MARKER: &str = "Managed by tether - DO NOT EDIT";

/// A generated definition and where it belongs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeArtifact {
    pub path: PathBuf,
    pub content: String,
    /// Environment keys whose earlier value was replaced by a later write.
    pub overridden_env: Vec<String>,
    /// Files the service writes its output to. Their directory must exist
    /// before the manager loads the definition.
    pub log_files: Vec<PathBuf>,
}

impl NativeArtifact {
    /// SHA-256 of the artifact content.
    #[must_use]
    pub fn digest(&self) -> String {
        digest(&self.content)
    }
}

/// Generate the native artifact for `definition` on `platform`.
///
/// # Errors
///
/// Returns [`ServiceError::UnsupportedPlatform`] when the platform has no
/// service manager.
pub fn generate(
    definition: &ServiceDefinition,
    platform: &PlatformCapability,
) -> Result<NativeArtifact, ServiceError> {
    let env = definition.resolved_environment();
    let qualified = qualify(&definition.name, platform.family);
    let content = match platform.family {
        PlatformFamily::Linux => systemd_unit(definition, &env),
        PlatformFamily::MacOs => launchd_plist(definition, &env, &qualified, &platform.log_dir),
        PlatformFamily::Windows => scm_record(definition, &env, &qualified, &platform.log_dir),
        PlatformFamily::Unsupported => {
            return Err(ServiceError::UnsupportedPlatform {
                platform: platform.os.clone(),
                operation: "start",
            });
        }
    };
    let path = platform
        .service_dir
        .join(artifact_file_name(&definition.name, platform.family).unwrap_or_default());
    Ok(NativeArtifact {
        path,
        content,
        overridden_env: env.overridden,
        log_files: log_files(&definition.name, platform),
    })
}

/// File name of the artifact for `name`, derived from the qualified name.
#[must_use]
pub fn artifact_file_name(name: &ServiceName, family: PlatformFamily) -> Option<String> {
    let qualified = qualify(name, family);
    match family {
        PlatformFamily::Linux => Some(format!("{qualified}.service")),
        PlatformFamily::MacOs => Some(format!("{qualified}.plist")),
        PlatformFamily::Windows => Some(format!("{qualified}.conf")),
        PlatformFamily::Unsupported => None,
    }
}

/// Full path of the artifact for `name` inside the platform service directory.
#[must_use]
pub fn artifact_path(name: &ServiceName, platform: &PlatformCapability) -> Option<PathBuf> {
    artifact_file_name(name, platform.family).map(|file| platform.service_dir.join(file))
}

/// Recover the service name from an artifact file name, if it is one of ours.
#[must_use]
pub fn name_from_file_name(file_name: &str, family: PlatformFamily) -> Option<ServiceName> {
    let qualified = match family {
        PlatformFamily::Linux => file_name.strip_suffix(".service")?,
        PlatformFamily::MacOs => file_name.strip_suffix(".plist")?,
        PlatformFamily::Windows => file_name.strip_suffix(".conf")?,
        PlatformFamily::Unsupported => return None,
    };
    crate::domain::name::unqualify(qualified, family)
}

/// Returns `true` if `content` carries the tether ownership marker.
#[must_use]
pub fn is_managed(content: &str) -> bool {
    content.lines().take(3).any(|line| line.contains(MANAGED_MARKER))
}

/// Compute the SHA-256 hex digest of artifact content.
#[must_use]
pub fn digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ── systemd ───────────────────────────────────────────────────────────────────

/// Generate a systemd user unit.
#[must_use]
pub fn systemd_unit(definition: &ServiceDefinition, env: &ResolvedEnvironment) -> String {
    let name = &definition.name;
    let restart = definition.restart;

    let mut exec_start = systemd_quote(&definition.executable.to_string_lossy());
    for arg in &definition.arguments {
        exec_start.push(' ');
        exec_start.push_str(&systemd_quote(arg));
    }

    let mut out = String::new();
    out.push_str(&format!("# {MANAGED_MARKER}\n"));
    out.push_str("[Unit]\n");
    out.push_str(&format!("Description=tether service {name}\n"));
    out.push_str("After=network-online.target\n");
    out.push_str("Wants=network-online.target\n");
    out.push('\n');
    out.push_str("[Service]\n");
    out.push_str("Type=simple\n");
    out.push_str(&format!(
        "WorkingDirectory={}\n",
        systemd_quote(&definition.working_directory.to_string_lossy())
    ));
    out.push_str(&format!("ExecStart={exec_start}\n"));
    out.push_str("Restart=on-failure\n");
    out.push_str(&format!("RestartSec={}\n", restart.restart_delay_secs));
    out.push_str(&format!("TimeoutStartSec={}\n", restart.start_timeout_secs));
    out.push_str(&format!("TimeoutStopSec={}\n", restart.stop_timeout_secs));
    for (key, value) in &env.vars {
        out.push_str(&format!(
            "Environment=\"{}\"\n",
            systemd_escape(&format!("{key}={value}"))
        ));
    }
    out.push_str("StandardOutput=journal\n");
    out.push_str("StandardError=journal\n");
    out.push_str(&format!("SyslogIdentifier={name}\n"));
    out.push('\n');
    out.push_str("[Install]\n");
    out.push_str("WantedBy=default.target\n");
    out
}

/// Escape a value for use inside a double-quoted systemd word.
fn systemd_escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('%', "%%")
        .replace('$', "$$")
}

/// Quote a systemd command-line word only when it needs it.
fn systemd_quote(s: &str) -> String {
    let plain = !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+:@,=".contains(c));
    if plain {
        s.to_string()
    } else {
        format!("\"{}\"", systemd_escape(s))
    }
}

// ── launchd ───────────────────────────────────────────────────────────────────

/// Generate a launchd agent property list.
#[must_use]
pub fn launchd_plist(
    definition: &ServiceDefinition,
    env: &ResolvedEnvironment,
    label: &str,
    log_dir: &Path,
) -> String {
    let restart = definition.restart;
    let name = definition.name.as_str();

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!("<!-- {MANAGED_MARKER} -->\n"));
    out.push_str("<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n");
    out.push_str("<plist version=\"1.0\">\n");
    out.push_str("<dict>\n");

    plist_string(&mut out, "Label", label);

    out.push_str("    <key>ProgramArguments</key>\n");
    out.push_str("    <array>\n");
    out.push_str(&format!(
        "        <string>{}</string>\n",
        escape_xml(&definition.executable.to_string_lossy())
    ));
    for arg in &definition.arguments {
        out.push_str(&format!("        <string>{}</string>\n", escape_xml(arg)));
    }
    out.push_str("    </array>\n");

    plist_string(
        &mut out,
        "WorkingDirectory",
        &definition.working_directory.to_string_lossy(),
    );

    out.push_str("    <key>EnvironmentVariables</key>\n");
    out.push_str("    <dict>\n");
    for (key, value) in &env.vars {
        out.push_str(&format!("        <key>{}</key>\n", escape_xml(key)));
        out.push_str(&format!("        <string>{}</string>\n", escape_xml(value)));
    }
    out.push_str("    </dict>\n");

    out.push_str("    <key>RunAtLoad</key>\n");
    out.push_str("    <true/>\n");
    // Restart only on non-zero exit.
    out.push_str("    <key>KeepAlive</key>\n");
    out.push_str("    <dict>\n");
    out.push_str("        <key>SuccessfulExit</key>\n");
    out.push_str("        <false/>\n");
    out.push_str("    </dict>\n");
    plist_integer(&mut out, "ThrottleInterval", restart.restart_delay_secs);
    plist_integer(&mut out, "ExitTimeOut", restart.stop_timeout_secs);

    plist_string(
        &mut out,
        "StandardOutPath",
        &log_dir.join(format!("{name}.out.log")).to_string_lossy(),
    );
    plist_string(
        &mut out,
        "StandardErrorPath",
        &log_dir.join(format!("{name}.err.log")).to_string_lossy(),
    );

    out.push_str("</dict>\n");
    out.push_str("</plist>\n");
    out
}

fn plist_string(out: &mut String, key: &str, value: &str) {
    out.push_str(&format!("    <key>{key}</key>\n"));
    out.push_str(&format!("    <string>{}</string>\n", escape_xml(value)));
}

fn plist_integer(out: &mut String, key: &str, value: u32) {
    out.push_str(&format!("    <key>{key}</key>\n"));
    out.push_str(&format!("    <integer>{value}</integer>\n"));
}

/// Escape special characters for XML.
#[must_use]
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

// ── Windows SCM ───────────────────────────────────────────────────────────────

/// Generate the SCM registration record.
///
/// The record is what `sc.exe create/config`, `sc.exe failure` and the
/// service's `Environment` registry value are built from, kept on disk so the
/// registration can be inspected and re-applied. SCM has no per-service
/// working directory, output redirection or start timeout, so `bin_path`
/// wraps the command in `cmd.exe` to enter the working directory and append
/// output to the log file. The stop timeout is enforced by the driver.
#[must_use]
pub fn scm_record(
    definition: &ServiceDefinition,
    env: &ResolvedEnvironment,
    service_name: &str,
    log_dir: &Path,
) -> String {
    let restart = definition.restart;
    let delay_ms = restart.restart_delay_secs * 1000;
    let log_file = log_dir.join(format!("{}.log", definition.name));

    let mut out = String::new();
    out.push_str(&format!("# {MANAGED_MARKER}\n"));
    out.push_str(&format!("service_name={service_name}\n"));
    out.push_str(&format!("display_name=tether {}\n", definition.name));
    out.push_str(&format!("bin_path={}\n", scm_command_line(definition, &log_file)));
    out.push_str(&format!(
        "working_directory={}\n",
        definition.working_directory.to_string_lossy()
    ));
    out.push_str("start_type=auto\n");
    out.push_str(&format!(
        "failure_actions=restart/{delay_ms}/restart/{delay_ms}/restart/{delay_ms}\n"
    ));
    out.push_str("failure_reset_secs=86400\n");
    out.push_str(&format!("stop_timeout_secs={}\n", restart.stop_timeout_secs));
    out.push_str(&format!("log_file={}\n", log_file.to_string_lossy()));
    for (key, value) in &env.vars {
        out.push_str(&format!("env={key}={value}\n"));
    }
    out
}

/// The command line registered as the SCM `binPath`: enter the working
/// directory, run the program, append both streams to `log_file`.
#[must_use]
pub fn scm_command_line(definition: &ServiceDefinition, log_file: &Path) -> String {
    let mut program = windows_quote(&definition.executable.to_string_lossy());
    for arg in &definition.arguments {
        program.push(' ');
        program.push_str(&windows_quote(arg));
    }
    // `/s` strips only the outermost quotes, leaving the inner ones intact.
    format!(
        "cmd.exe /d /s /c \"cd /d {} && {program} >> {} 2>&1\"",
        cmd_quote(&definition.working_directory.to_string_lossy()),
        cmd_quote(&log_file.to_string_lossy()),
    )
}

fn windows_quote(s: &str) -> String {
    if !s.is_empty() && !s.contains([' ', '\t', '"']) {
        s.to_string()
    } else {
        format!("\"{}\"", s.replace('"', "\\\""))
    }
}

/// Paths in a `cmd.exe` line are always quoted; `&`, `(` and `^` are legal
/// in Windows paths.
fn cmd_quote(s: &str) -> String {
    format!("\"{s}\"")
}

// ── Read-back ─────────────────────────────────────────────────────────────────

static SYSTEMD_OR_SCM_PORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r#"(?m)(?:^env=|Environment=")PORT=(\d{1,5})"#).expect("valid regex")
});

static PLIST_PORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"<key>PORT</key>\s*<string>(\d{1,5})</string>").expect("valid regex")
});

/// Read the `PORT` value back out of a generated artifact.
#[must_use]
pub fn read_port(content: &str) -> Option<u16> {
    SYSTEMD_OR_SCM_PORT_RE
        .captures(content)
        .or_else(|| PLIST_PORT_RE.captures(content))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Read the `bin_path=` line of an SCM record.
#[must_use]
pub fn scm_bin_path(content: &str) -> Option<&str> {
    content.lines().find_map(|line| line.strip_prefix("bin_path="))
}

/// Read the `env=` lines of an SCM record, in order.
#[must_use]
pub fn scm_environment(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| line.strip_prefix("env="))
        .map(str::to_string)
        .collect()
}
