//! Health polling error types.

use thiserror::Error;

/// Errors raised while constructing a polling store.
///
/// Poll failures are not errors; they are recorded as unavailability.
#[derive(Debug, Error)]
pub enum HealthError {
    #[error("polling store must be created inside a tokio runtime")]
    NoRuntime,

    #[error("polling interval must be greater than zero")]
    ZeroInterval,

    #[error("failed to build health client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("store error: {0}")]
    Store(#[from] svcreg_store::StoreError),
}

pub type HealthResult<T> = Result<T, HealthError>;
