use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a managed service as observed through the native manager.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    /// Neither an artifact nor a manager registration exists.
    NotFound,
    /// The artifact exists on disk but the manager has not loaded it.
    Installed,
    Starting,
    Running,
    Stopped,
    Failed,
}

impl ServiceState {
    /// Returns `true` when the manager knows about the service in any form.
    #[must_use]
    pub fn exists(self) -> bool {
        self != ServiceState::NotFound
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceState::NotFound => "not found",
            ServiceState::Installed => "installed",
            ServiceState::Starting => "starting",
            ServiceState::Running => "running",
            ServiceState::Stopped => "stopped",
            ServiceState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// HTTP endpoints a managed service is expected to expose.
///
/// Handed to the dashboard and alerting collaborators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceEndpoints {
    pub health_url: String,
    pub metrics_url: String,
}

impl ServiceEndpoints {
    /// Endpoints on the loopback interface for the given port.
    #[must_use]
    pub fn for_port(port: u16) -> Self {
        Self {
            health_url: format!("http://127.0.0.1:{port}/healthz"),
            metrics_url: format!("http://127.0.0.1:{port}/metrics"),
        }
    }
}

/// Status document for one service (`tether status --json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatusOutput {
    pub name: String,
    pub qualified_name: String,
    pub state: ServiceState,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<ServiceEndpoints>,
}

/// Outcome of one member of a batch operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BatchOutcome {
    Success,
    Failure,
}

/// Per-service result of a batch operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchResult {
    pub service: String,
    pub outcome: BatchOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchResult {
    #[must_use]
    pub fn success(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            outcome: BatchOutcome::Success,
            error: None,
        }
    }

    #[must_use]
    pub fn failure(service: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            outcome: BatchOutcome::Failure,
            error: Some(error.into()),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome == BatchOutcome::Success
    }
}

/// Aggregate counts derived from a set of [`BatchResult`]s.
///
/// Always built from the result set itself via [`BatchSummary::from_results`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub success_percent: f64,
    pub failure_percent: f64,
}

impl BatchSummary {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_results(results: &[BatchResult]) -> Self {
        let total = results.len();
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let failed = total - succeeded;
        let percent = |n: usize| {
            if total == 0 {
                0.0
            } else {
                (n as f64 / total as f64) * 100.0
            }
        };
        Self {
            total,
            succeeded,
            failed,
            success_percent: percent(succeeded),
            failure_percent: percent(failed),
        }
    }

    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Payload posted to the alert webhook when a health check fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertPayload {
    pub service: String,
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}
