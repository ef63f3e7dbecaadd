//! RedbStore — redb-backed durable service store.
//!
//! One `services` table maps service URL → MessagePack-encoded `Service`.
//! Values use the named (map) encoding, so every value carries its own
//! field names. Each `register` is one write transaction and each `list`
//! one read transaction.

use std::path::Path;

use parking_lot::RwLock;
use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::store::ServiceStore;
use crate::tables::SERVICES;
use crate::types::Service;

/// Convert any `Display` error into a `StoreError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StoreError::$variant(e.to_string())
    };
}

/// Durable store backed by a single redb file.
pub struct RedbStore {
    /// `None` once the store has been closed.
    db: RwLock<Option<Database>>,
    location: String,
}

impl RedbStore {
    /// Open (or create) a store at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        ensure_tables(&db)?;
        debug!(?path, "service store opened");
        Ok(Self {
            db: RwLock::new(Some(db)),
            location: path.display().to_string(),
        })
    }

    /// Create an ephemeral in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        ensure_tables(&db)?;
        debug!("in-memory service store opened");
        Ok(Self {
            db: RwLock::new(Some(db)),
            location: "in-memory".to_string(),
        })
    }

    /// Read the persisted record for `service_url` directly from disk.
    ///
    /// Bypasses any decorator, so freshness overlays never show up here.
    pub fn get(&self, service_url: &str) -> StoreResult<Option<Service>> {
        self.with_db(|db| {
            let txn = db.begin_read().map_err(map_err!(Transaction))?;
            let table = txn.open_table(SERVICES).map_err(map_err!(Table))?;
            match table.get(service_url).map_err(map_err!(Read))? {
                Some(guard) => Ok(Some(decode(guard.value())?)),
                None => Ok(None),
            }
        })
    }

    fn with_db<T>(&self, f: impl FnOnce(&Database) -> StoreResult<T>) -> StoreResult<T> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(StoreError::Closed)?;
        f(db)
    }
}

impl ServiceStore for RedbStore {
    fn register(&self, service: Service) -> StoreResult<()> {
        let value = encode(&service)?;
        self.with_db(|db| {
            let txn = db.begin_write().map_err(map_err!(Transaction))?;
            {
                let mut table = txn.open_table(SERVICES).map_err(map_err!(Table))?;
                table
                    .insert(service.table_key(), value.as_slice())
                    .map_err(map_err!(Write))?;
            }
            txn.commit().map_err(map_err!(Transaction))?;
            Ok(())
        })?;
        debug!(key = %service.table_key(), "service stored");
        Ok(())
    }

    /// A single undecodable value fails the whole listing.
    fn list(&self) -> StoreResult<Vec<Service>> {
        self.with_db(|db| {
            let txn = db.begin_read().map_err(map_err!(Transaction))?;
            let table = txn.open_table(SERVICES).map_err(map_err!(Table))?;
            let mut results = Vec::new();
            for entry in table.iter().map_err(map_err!(Read))? {
                let (_, value) = entry.map_err(map_err!(Read))?;
                results.push(decode(value.value())?);
            }
            Ok(results)
        })
    }

    fn close(&self) -> StoreResult<()> {
        if self.db.write().take().is_some() {
            debug!(location = %self.location, "service store closed");
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("redb ({})", self.location)
    }
}

/// Create all tables if they don't exist yet.
fn ensure_tables(db: &Database) -> StoreResult<()> {
    let txn = db.begin_write().map_err(map_err!(Transaction))?;
    // Opening a table in a write transaction creates it if absent.
    txn.open_table(SERVICES).map_err(map_err!(Table))?;
    txn.commit().map_err(map_err!(Transaction))?;
    Ok(())
}

fn encode(service: &Service) -> StoreResult<Vec<u8>> {
    rmp_serde::to_vec_named(service).map_err(map_err!(Serialize))
}

fn decode(bytes: &[u8]) -> StoreResult<Service> {
    rmp_serde::from_slice(bytes).map_err(map_err!(Deserialize))
}
