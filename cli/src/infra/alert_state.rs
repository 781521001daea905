//! Infrastructure implementation of the `AlertStateStore` port.
//!
//! JSON file under the tether config directory, written atomically
//! (temp file + rename) with owner-only permissions.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::AlertStateStore;
use crate::domain::alert::AlertState;

/// File name of the cooldown map inside the config directory.
pub const ALERT_STATE_FILE: &str = "alerts.json";

/// Alert state file manager.
pub struct AlertStateFile {
    path: PathBuf,
}

impl AlertStateFile {
    /// Store at `<config_dir>/alerts.json`.
    #[must_use]
    pub fn in_dir(config_dir: &Path) -> Self {
        Self::with_path(config_dir.join(ALERT_STATE_FILE))
    }

    /// Create a store with an explicit path (used in tests).
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }
}

impl AlertStateStore for AlertStateFile {
    fn load(&self) -> Result<AlertState> {
        if !self.path.exists() {
            return Ok(AlertState::default());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading alert state {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("parsing alert state {}", self.path.display()))
    }

    fn save(&self, state: &AlertState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(state).context("serializing alert state")?;

        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, &content)
            .with_context(|| format!("writing temp file {}", temp_path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("setting permissions on {}", temp_path.display()))?;
        }

        std::fs::rename(&temp_path, &self.path)
            .with_context(|| format!("finalizing alert state {}", self.path.display()))?;
        Ok(())
    }
}
