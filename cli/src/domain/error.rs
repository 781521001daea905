//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Service errors ────────────────────────────────────────────────────────────

/// Errors raised by the service lifecycle engine.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid service name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error(
        "Security audit rejected {path}:\n{}\n\nFix the findings above before starting this service.",
        bullet_list(.findings)
    )]
    AuditRejected { path: String, findings: Vec<String> },

    #[error("Failed to write service definition {path}: {message}")]
    DefinitionWriteFailed { path: String, message: String },

    #[error("{manager} failed for service '{service}': {message}")]
    NativeManagerFailed {
        service: String,
        manager: &'static str,
        message: String,
    },

    #[error("Platform '{platform}' is not supported for operation '{operation}'")]
    UnsupportedPlatform {
        platform: String,
        operation: &'static str,
    },

    #[error("Service '{0}' not found. Create it with: tether start <entry> --name {0}")]
    NotFound(String),

    #[error("Invalid environment variable '{entry}': {reason}")]
    InvalidEnv { entry: String, reason: &'static str },

    #[error("Service '{service}' is not managed by tether: {reason}")]
    NotManaged { service: String, reason: &'static str },
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("  - {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

impl ServiceError {
    /// Short machine-readable code used by `--json` error output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::InvalidName { .. } => "invalid_name",
            ServiceError::AuditRejected { .. } => "audit_rejected",
            ServiceError::DefinitionWriteFailed { .. } => "definition_write_failed",
            ServiceError::NativeManagerFailed { .. } => "native_manager_failed",
            ServiceError::UnsupportedPlatform { .. } => "unsupported_platform",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::InvalidEnv { .. } => "invalid_env",
            ServiceError::NotManaged { .. } => "not_managed",
        }
    }
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\n{hint}")]
    InvalidValue {
        key: String,
        value: String,
        hint: String,
    },
}
