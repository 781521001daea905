//! Application service: configuration use-cases.

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::config::TetherConfig;

/// Load configuration.
pub fn load_config(store: &impl ConfigStore) -> Result<TetherConfig> {
    store.load()
}

/// Validate `key = value`, apply it and save. Nothing is written when
/// validation fails.
///
/// # Errors
///
/// Returns an error if the key or value is invalid or the file cannot be
/// written.
pub fn set_config_value(store: &impl ConfigStore, key: &str, value: &str) -> Result<TetherConfig> {
    let mut config = store.load()?;
    config.set(key, value)?;
    store.save(&config)?;
    Ok(config)
}
