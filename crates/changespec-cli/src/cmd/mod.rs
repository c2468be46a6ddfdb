pub mod changespec;
pub mod commit;
pub mod hook;
pub mod init;
pub mod query;
pub mod status;

use anyhow::Context;
use changespec_core::config::{Config, WarnLevel};
use changespec_core::project::Store;
use std::path::Path;

/// Load config, surface its warnings, and open the project store.
pub(crate) fn open(root: &Path) -> anyhow::Result<(Config, Store)> {
    let config = Config::load(root).context("failed to load config")?;
    for warning in config.validate() {
        match warning.level {
            WarnLevel::Error => tracing::warn!(severity = "error", "config: {}", warning.message),
            WarnLevel::Warning => tracing::warn!("config: {}", warning.message),
        }
    }
    let store = Store::open(root, &config);
    tracing::debug!(path = %store.path().display(), "opened project file");
    Ok((config, store))
}
