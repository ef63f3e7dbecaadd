//! svcreg-store — service record storage for svcreg.
//!
//! Defines the [`Service`] record, the [`ServiceStore`] contract every
//! backend satisfies, and two backends:
//!
//! - [`MemoryStore`]: a lock-guarded `HashMap`, nothing survives a restart.
//! - [`RedbStore`]: a single [redb](https://docs.rs/redb) file with one
//!   `services` table, values MessagePack-encoded.
//!
//! # Architecture
//!
//! ```text
//! ServiceStore (trait)
//!   ├── MemoryStore
//!   ├── RedbStore
//!   └── decorators (e.g. svcreg-health::PollingStore<S>)
//! ```
//!
//! Records are keyed by service URL. `register` is an upsert; there is
//! no delete. Stores perform no validation, the caller does.

pub mod durable;
pub mod error;
pub mod memory;
pub mod store;
pub mod tables;
pub mod types;

pub use durable::RedbStore;
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use store::ServiceStore;
pub use types::Service;
