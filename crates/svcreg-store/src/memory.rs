//! MemoryStore — volatile in-process backend.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::StoreResult;
use crate::store::ServiceStore;
use crate::types::Service;

/// `HashMap`-backed store. All data is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    services: RwLock<HashMap<String, Service>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ServiceStore for MemoryStore {
    fn register(&self, service: Service) -> StoreResult<()> {
        let key = service.table_key().to_string();
        self.services.write().insert(key.clone(), service);
        debug!(%key, "service stored");
        Ok(())
    }

    /// Returns owned clones; mutating them never touches the store.
    fn list(&self) -> StoreResult<Vec<Service>> {
        Ok(self.services.read().values().cloned().collect())
    }

    fn close(&self) -> StoreResult<()> {
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
