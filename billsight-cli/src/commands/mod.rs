//! CLI command implementations.

pub mod bills;
pub mod check;
pub mod config;
pub mod process;
pub mod providers;

use anyhow::{Context, Result};
use billsight_store::{BillStore, Settings, SettingsStore, ensure_dir};

/// Loads settings from the default location.
pub(crate) async fn load_settings() -> Settings {
    SettingsStore::load_default().await.get().await
}

/// Opens the bill database named by `settings`, creating its directory.
pub(crate) async fn open_store(settings: &Settings) -> Result<BillStore> {
    let path = settings.database_path();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent).await?;
    }
    BillStore::open(&path).with_context(|| format!("failed to open database {}", path.display()))
}
