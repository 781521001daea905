//! Alert cooldown state.
//!
//! Owned by the command that loads it and passed explicitly to whatever
//! mutates it; persisted by `crate::infra::alert_state` after every change.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last alert time per service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertState {
    pub last_alert: BTreeMap<String, DateTime<Utc>>,
}

impl AlertState {
    /// Whether an alert for `service` may be sent at `now`.
    ///
    /// A clock that moved backwards counts as outside the window.
    #[must_use]
    pub fn should_alert(&self, service: &str, now: DateTime<Utc>, cooldown_secs: u64) -> bool {
        let Some(last) = self.last_alert.get(service) else {
            return true;
        };
        let elapsed = now.signed_duration_since(*last).num_seconds();
        u64::try_from(elapsed).map_or(true, |elapsed| elapsed >= cooldown_secs)
    }

    /// Record that an alert for `service` was sent at `now`.
    pub fn record(&mut self, service: &str, now: DateTime<Utc>) {
        self.last_alert.insert(service.to_string(), now);
    }

    /// Drop the entry for `service`. Returns `true` if one existed.
    pub fn forget(&mut self, service: &str) -> bool {
        self.last_alert.remove(service).is_some()
    }
}
