//! Application service: health probe with cooldown-limited alerting.

use anyhow::Result;
use chrono::{DateTime, Utc};
use tether_common::{AlertPayload, ServiceEndpoints};

use crate::application::ports::{
    AlertSink, AlertStateStore, HealthProbe, LocalFs, ProbeResult, ServiceManager,
};
use crate::domain::alert::AlertState;
use crate::domain::artifact::{artifact_path, read_port};
use crate::domain::config::AlertsConfig;
use crate::domain::definition::DEFAULT_PORT;
use crate::domain::error::ServiceError;
use crate::domain::name::ServiceName;

/// What happened on the alerting side of a health check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertDecision {
    /// The service is healthy.
    NotNeeded,
    /// Unhealthy, but no webhook is configured.
    NotConfigured,
    /// Unhealthy, but an alert was sent inside the cooldown window.
    Suppressed,
    Sent,
    /// Delivery failed. The cooldown was not started.
    Failed(String),
}

/// Result of `tether health <name>`.
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub name: ServiceName,
    pub url: String,
    pub probe: ProbeResult,
    pub alert: AlertDecision,
}

impl HealthReport {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.probe.healthy
    }
}

/// Borrowed collaborators for [`check_health`].
pub struct HealthDeps<'a, P, S, A> {
    pub probe: &'a P,
    pub sink: &'a S,
    pub store: &'a A,
}

/// Probe `name`'s `/healthz` and alert when it is unhealthy.
///
/// `state` is saved through `store` after every change to it.
///
/// # Errors
///
/// Returns [`ServiceError::NotFound`] when no definition exists for `name`,
/// or an error if the alert state cannot be saved.
pub async fn check_health<P, S, A>(
    manager: &impl ServiceManager,
    fs: &impl LocalFs,
    deps: HealthDeps<'_, P, S, A>,
    state: &mut AlertState,
    alerts: &AlertsConfig,
    name: &ServiceName,
    now: DateTime<Utc>,
) -> Result<HealthReport>
where
    P: HealthProbe,
    S: AlertSink,
    A: AlertStateStore,
{
    let platform = manager.capability();
    let content = artifact_path(name, platform)
        .filter(|path| fs.exists(path))
        .and_then(|path| fs.read_to_string(&path).ok())
        .ok_or_else(|| ServiceError::NotFound(name.to_string()))?;
    let port = read_port(&content).unwrap_or(DEFAULT_PORT);
    let url = ServiceEndpoints::for_port(port).health_url;

    let probe = deps.probe.probe(&url).await;
    tracing::debug!(service = %name, %url, healthy = probe.healthy, "health probe");

    let alert = if probe.healthy {
        // Recovered: the next failure alerts immediately.
        if state.forget(name.as_str()) {
            deps.store.save(state)?;
        }
        AlertDecision::NotNeeded
    } else if let Some(webhook) = alerts.webhook.as_deref() {
        if state.should_alert(name.as_str(), now, alerts.cooldown_secs) {
            let payload = AlertPayload {
                service: name.to_string(),
                status: "unhealthy".to_string(),
                message: probe.message.clone(),
                timestamp: now,
            };
            match deps.sink.send(webhook, &payload).await {
                Ok(()) => {
                    state.record(name.as_str(), now);
                    deps.store.save(state)?;
                    tracing::info!(service = %name, "alert sent");
                    AlertDecision::Sent
                }
                Err(e) => {
                    tracing::warn!(service = %name, "alert delivery failed: {e:#}");
                    AlertDecision::Failed(format!("{e:#}"))
                }
            }
        } else {
            AlertDecision::Suppressed
        }
    } else {
        AlertDecision::NotConfigured
    };

    Ok(HealthReport {
        name: name.clone(),
        url,
        probe,
        alert,
    })
}
