//! Strongly-typed service definition and environment resolution.
//!
//! Pure functions only: no I/O, no async.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::error::ServiceError;
use crate::domain::name::ServiceName;

/// Port used when `--port` is not given.
pub const DEFAULT_PORT: u16 = 3000;

/// Fixed environment marker injected into every service.
pub const ENV_MARKER: (&str, &str) = ("NODE_ENV", "production");

/// Default OTLP traces endpoint.
pub const DEFAULT_OTEL_ENDPOINT: &str = "http://localhost:4318/v1/traces";

/// Path the service is expected to expose metrics on.
pub const METRICS_PATH: &str = "/metrics";

static ENV_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex")
});

/// Restart behaviour handed to the native manager.
///
/// Not user-configurable: every service restarts on failure with a short
/// fixed backoff and bounded start/stop timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    pub restart_delay_secs: u32,
    pub start_timeout_secs: u32,
    pub stop_timeout_secs: u32,
}

impl RestartPolicy {
    pub const FIXED: RestartPolicy = RestartPolicy {
        restart_delay_secs: 2,
        start_timeout_secs: 30,
        stop_timeout_secs: 30,
    };
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self::FIXED
    }
}

/// Which observability variables to inject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObservabilityFlags {
    pub otel: bool,
    pub prometheus: bool,
}

/// Everything needed to generate a native definition artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDefinition {
    pub name: ServiceName,
    /// Absolute path of the program the manager launches.
    pub executable: PathBuf,
    pub arguments: Vec<String>,
    pub working_directory: PathBuf,
    pub port: u16,
    /// User-supplied variables in the order given on the command line.
    pub environment: Vec<(String, String)>,
    pub restart: RestartPolicy,
    pub observability: ObservabilityFlags,
    pub otel_endpoint: String,
}

/// The final environment block for a definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedEnvironment {
    /// One entry per key, in first-seen order, carrying the last written value.
    pub vars: Vec<(String, String)>,
    /// Keys written more than once, in the order the overwrite happened.
    pub overridden: Vec<String>,
}

impl ResolvedEnvironment {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl ServiceDefinition {
    /// Resolve the environment in its fixed order:
    ///
    /// `PORT`, `NODE_ENV`, `SERVICE_NAME`, user variables, then the
    /// observability variables. Duplicate keys resolve last-write-wins; since
    /// observability variables are written last, users cannot override them.
    #[must_use]
    pub fn resolved_environment(&self) -> ResolvedEnvironment {
        let mut writes: Vec<(String, String)> = vec![
            ("PORT".to_string(), self.port.to_string()),
            (ENV_MARKER.0.to_string(), ENV_MARKER.1.to_string()),
            ("SERVICE_NAME".to_string(), self.name.to_string()),
        ];
        writes.extend(self.environment.iter().cloned());
        if self.observability.otel {
            writes.push(("OTEL_SERVICE_NAME".to_string(), self.name.to_string()));
            writes.push((
                "OTEL_EXPORTER_OTLP_TRACES_ENDPOINT".to_string(),
                self.otel_endpoint.clone(),
            ));
        }
        if self.observability.prometheus {
            writes.push(("PROMETHEUS_METRICS_PATH".to_string(), METRICS_PATH.to_string()));
        }

        let mut resolved = ResolvedEnvironment::default();
        for (key, value) in writes {
            if let Some(slot) = resolved.vars.iter_mut().find(|(k, _)| *k == key) {
                slot.1 = value;
                resolved.overridden.push(key);
            } else {
                resolved.vars.push((key, value));
            }
        }
        resolved
    }
}

/// Parse a `KEY=VALUE` pair from `--env`.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidEnv`] when `=` is missing, the key is not a
/// portable identifier, or the value contains a newline or NUL.
pub fn parse_env_pair(entry: &str) -> Result<(String, String), ServiceError> {
    let invalid = |reason| ServiceError::InvalidEnv {
        entry: entry.to_string(),
        reason,
    };
    let (key, value) = entry.split_once('=').ok_or_else(|| invalid("expected KEY=VALUE"))?;
    if !ENV_KEY_RE.is_match(key) {
        return Err(invalid("key must match [A-Za-z_][A-Za-z0-9_]*"));
    }
    if value.contains(['\n', '\r', '\0']) {
        return Err(invalid("value must not contain newlines or NUL"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// The port the service listens on: the last user `PORT`, else `port`.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidEnv`] when a user `PORT` is not a port
/// number, since health and metrics URLs are derived from it.
pub fn effective_port(port: u16, environment: &[(String, String)]) -> Result<u16, ServiceError> {
    let Some((key, value)) = environment.iter().rev().find(|(k, _)| k == "PORT") else {
        return Ok(port);
    };
    value
        .parse::<u16>()
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| ServiceError::InvalidEnv {
            entry: format!("{key}={value}"),
            reason: "PORT must be a number between 1 and 65535",
        })
}
