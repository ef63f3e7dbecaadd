//! The `ServiceStore` contract.

use std::sync::Arc;

use crate::error::StoreResult;
use crate::types::Service;

/// Capability set every service backend provides.
///
/// Implementations must be safe to call concurrently. Records reaching
/// `register` are already validated; stores never re-validate.
pub trait ServiceStore: Send + Sync {
    /// Insert or overwrite the record keyed by `service.service_url`.
    fn register(&self, service: Service) -> StoreResult<()>;

    /// Snapshot of every stored record. Order is unspecified.
    fn list(&self) -> StoreResult<Vec<Service>>;

    /// Release backend resources. A second call must not corrupt state.
    fn close(&self) -> StoreResult<()>;

    /// Human-readable identity of the backend, for log lines.
    fn describe(&self) -> String;
}

impl<S: ServiceStore + ?Sized> ServiceStore for Arc<S> {
    fn register(&self, service: Service) -> StoreResult<()> {
        (**self).register(service)
    }

    fn list(&self) -> StoreResult<Vec<Service>> {
        (**self).list()
    }

    fn close(&self) -> StoreResult<()> {
        (**self).close()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<S: ServiceStore + ?Sized> ServiceStore for Box<S> {
    fn register(&self, service: Service) -> StoreResult<()> {
        (**self).register(service)
    }

    fn list(&self) -> StoreResult<Vec<Service>> {
        (**self).list()
    }

    fn close(&self) -> StoreResult<()> {
        (**self).close()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
