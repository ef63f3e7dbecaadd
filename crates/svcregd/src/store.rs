//! Store assembly from resolved settings.

use std::sync::Arc;

use svcreg_health::PollingStore;
use svcreg_store::{MemoryStore, RedbStore, ServiceStore};
use tracing::info;

use crate::config::{Settings, StoreSettings};

/// Build the backend named by `settings`, wrapped for health polling
/// when an interval is configured.
///
/// Must run inside a tokio runtime when polling is enabled.
pub fn build_store(settings: &Settings) -> anyhow::Result<Arc<dyn ServiceStore>> {
    let backend: Arc<dyn ServiceStore> = match &settings.store {
        StoreSettings::Memory => Arc::new(MemoryStore::new()),
        StoreSettings::Redb { path } => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let store = RedbStore::open(path)?;
            info!(?path, "redb store opened");
            Arc::new(store)
        }
    };

    match settings.poll_interval {
        Some(interval) => Ok(Arc::new(PollingStore::new(backend, interval)?)),
        None => Ok(backend),
    }
}
