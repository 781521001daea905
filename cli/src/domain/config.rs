//! Domain types and validators for tether configuration.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::definition::DEFAULT_OTEL_ENDPOINT;
use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "runtime",
    "otel.endpoint",
    "alerts.webhook",
    "alerts.cooldown_secs",
];

/// Default alert cooldown window.
pub const DEFAULT_COOLDOWN_SECS: u64 = 300;

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.config/tether/config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TetherConfig {
    /// Program used to run (and `--build`) entry files.
    pub runtime: String,
    pub otel: OtelConfig,
    pub alerts: AlertsConfig,
}

impl Default for TetherConfig {
    fn default() -> Self {
        Self {
            runtime: "bun".to_string(),
            otel: OtelConfig::default(),
            alerts: AlertsConfig::default(),
        }
    }
}

/// OpenTelemetry settings injected into `--otel` services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OtelConfig {
    pub endpoint: String,
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_OTEL_ENDPOINT.to_string(),
        }
    }
}

/// Health alert delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<String>,
    pub cooldown_secs: u64,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            webhook: None,
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
        }
    }
}

impl TetherConfig {
    /// Validate and apply `value` to `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is invalid for it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_config_key(key)?;
        validate_config_value(key, value)?;
        match key {
            "runtime" => self.runtime = value.to_string(),
            "otel.endpoint" => self.otel.endpoint = value.to_string(),
            "alerts.webhook" => {
                self.alerts.webhook = (!value.is_empty()).then(|| value.to_string());
            }
            "alerts.cooldown_secs" => {
                // Parsed successfully by validate_config_value.
                self.alerts.cooldown_secs = value.parse().unwrap_or(DEFAULT_COOLDOWN_SECS);
            }
            _ => {}
        }
        Ok(())
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Validates a configuration value for the given key.
///
/// An empty `alerts.webhook` clears the webhook.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    let invalid = |hint: &str| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        hint: hint.to_string(),
    };
    match key {
        "runtime" => {
            if value.is_empty() || value.chars().any(char::is_whitespace) {
                return Err(invalid("Runtime must be a program name or path without spaces.").into());
            }
        }
        "otel.endpoint" => {
            if !is_http_url(value) {
                return Err(invalid("Expected an http:// or https:// URL.").into());
            }
        }
        "alerts.webhook" => {
            if !value.is_empty() && !is_http_url(value) {
                return Err(
                    invalid("Expected an http:// or https:// URL, or an empty value to clear.")
                        .into(),
                );
            }
        }
        "alerts.cooldown_secs" => {
            if value.parse::<u64>().is_err() {
                return Err(invalid("Expected a whole number of seconds.").into());
            }
        }
        _ => {}
    }
    Ok(())
}

fn is_http_url(value: &str) -> bool {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    rest.is_some_and(|r| !r.is_empty() && !r.chars().any(char::is_whitespace))
}

// ── Unit tests ───────────────────────────────────────────────────────────────
