//! Log locations and the tailing command for each platform.

use std::path::PathBuf;

use crate::domain::name::{ServiceName, qualify};
use crate::domain::platform::{PlatformCapability, PlatformFamily};

/// Lines shown when `-n` is not given.
pub const DEFAULT_LOG_LINES: u32 = 100;

/// An external command that prints (and optionally follows) service logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogCommand {
    pub program: String,
    pub args: Vec<String>,
}

/// Log files tether owns for `name`. Empty on Linux, where the journal keeps
/// the output.
#[must_use]
pub fn log_files(name: &ServiceName, platform: &PlatformCapability) -> Vec<PathBuf> {
    match platform.family {
        PlatformFamily::MacOs => vec![
            platform.log_dir.join(format!("{name}.out.log")),
            platform.log_dir.join(format!("{name}.err.log")),
        ],
        PlatformFamily::Windows => vec![platform.log_dir.join(format!("{name}.log"))],
        PlatformFamily::Linux | PlatformFamily::Unsupported => Vec::new(),
    }
}

/// Build the tailing command, or `None` on an unsupported platform.
#[must_use]
pub fn log_command(
    name: &ServiceName,
    platform: &PlatformCapability,
    lines: u32,
    follow: bool,
) -> Option<LogCommand> {
    let lines = lines.to_string();
    match platform.family {
        PlatformFamily::Linux => {
            let unit = format!("{}.service", qualify(name, platform.family));
            let mut args: Vec<String> = ["--user", "--no-pager", "-u", &unit, "-n", &lines]
                .into_iter()
                .map(str::to_string)
                .collect();
            if follow {
                args.push("-f".to_string());
            }
            Some(LogCommand {
                program: "journalctl".to_string(),
                args,
            })
        }
        PlatformFamily::MacOs => {
            let mut args = vec!["-n".to_string(), lines];
            if follow {
                args.push("-F".to_string());
            }
            args.extend(
                log_files(name, platform)
                    .into_iter()
                    .map(|p| p.to_string_lossy().into_owned()),
            );
            Some(LogCommand {
                program: "tail".to_string(),
                args,
            })
        }
        PlatformFamily::Windows => {
            let file = log_files(name, platform)
                .into_iter()
                .next()
                .map(|p| p.to_string_lossy().replace('\'', "''"))
                .unwrap_or_default();
            let mut script = format!("Get-Content -Path '{file}' -Tail {lines}");
            if follow {
                script.push_str(" -Wait");
            }
            Some(LogCommand {
                program: "powershell".to_string(),
                args: vec!["-NoProfile".to_string(), "-Command".to_string(), script],
            })
        }
        PlatformFamily::Unsupported => None,
    }
}
