//! svcreg-health — health polling for svcreg.
//!
//! [`PollingStore`] wraps any [`svcreg_store::ServiceStore`] and runs one
//! background task per service that declares a health-check URL. Poll
//! results live in memory and are overlaid onto listed records; they are
//! never written back to the wrapped store.
//!
//! # Architecture
//!
//! ```text
//! PollingStore<S>
//!   ├── inner: S (memory, redb, ...)
//!   ├── launch set: service_url → PollerSlot (task handle + shutdown tx)
//!   ├── freshness: service_url → Freshness   (one RwLock for all fields)
//!   └── per-service task
//!       ├── HealthClient::probe() → ProbeResult
//!       └── record result under the freshness write lock
//! ```
//!
//! Probes go through one pooled HTTP(S) client. Polls run on a fixed
//! interval. There is no backoff and no retry; a failed poll is just
//! `available = false`.

pub mod checker;
pub mod error;
pub mod poller;

#[cfg(test)]
mod test_tls;

pub use checker::{HealthClient, ProbeResult};
pub use error::{HealthError, HealthResult};
pub use poller::{Freshness, PollingStore};
