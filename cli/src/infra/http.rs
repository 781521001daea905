//! HTTP collaborators: health probe and alert webhook over `ureq`.
//!
//! `ureq` is blocking, so every call runs on the blocking pool.

use std::time::Duration;

use anyhow::{Context, Result};
use tether_common::AlertPayload;

use crate::application::ports::{AlertSink, HealthProbe, ProbeResult};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Probes `/healthz` with a short GET.
pub struct UreqHealthProbe;

impl HealthProbe for UreqHealthProbe {
    async fn probe(&self, url: &str) -> ProbeResult {
        let url = url.to_string();
        let result = tokio::task::spawn_blocking(move || {
            match ureq::get(&url).timeout(PROBE_TIMEOUT).call() {
                Ok(resp) => ProbeResult {
                    healthy: true,
                    status_code: Some(resp.status()),
                    message: format!("HTTP {}", resp.status()),
                },
                Err(ureq::Error::Status(code, _)) => ProbeResult {
                    healthy: false,
                    status_code: Some(code),
                    message: format!("health endpoint returned HTTP {code}"),
                },
                Err(e) => ProbeResult {
                    healthy: false,
                    status_code: None,
                    message: format!("health endpoint unreachable: {e}"),
                },
            }
        })
        .await;
        result.unwrap_or_else(|e| ProbeResult {
            healthy: false,
            status_code: None,
            message: format!("health probe task failed: {e}"),
        })
    }
}

/// Posts alerts as JSON to a webhook.
pub struct UreqAlertSink;

impl AlertSink for UreqAlertSink {
    async fn send(&self, webhook: &str, payload: &AlertPayload) -> Result<()> {
        let body = serde_json::to_string(payload).context("serializing alert")?;
        let webhook = webhook.to_string();
        tokio::task::spawn_blocking(move || {
            match ureq::post(&webhook)
                .timeout(WEBHOOK_TIMEOUT)
                .set("Content-Type", "application/json")
                .set("User-Agent", "tether-cli")
                .send_string(&body)
            {
                Ok(_) => Ok(()),
                Err(ureq::Error::Status(code, _)) => anyhow::bail!("webhook returned HTTP {code}"),
                Err(e) => Err(anyhow::Error::new(e).context("webhook unreachable")),
            }
        })
        .await
        .context("alert delivery task panicked")?
    }
}
