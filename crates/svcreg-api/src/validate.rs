//! Validation of inbound service records.

use thiserror::Error;
use url::Url;

use svcreg_store::Service;

/// Why an inbound record was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field} is not a valid absolute URL: {reason}")]
    InvalidUrl { field: &'static str, reason: String },
}

/// Check required fields and URL well-formedness.
///
/// `service_url`, `spec_url` and `description` must be non-empty. Both
/// URLs, and the health-check URL when present, must parse as absolute.
pub fn validate_service(service: &Service) -> Result<(), ValidationError> {
    require("service_url", &service.service_url)?;
    require("spec_url", &service.spec_url)?;
    require("description", &service.description)?;

    absolute_url("service_url", &service.service_url)?;
    absolute_url("spec_url", &service.spec_url)?;
    if !service.healthcheck_url.is_empty() {
        absolute_url("healthcheck_url", &service.healthcheck_url)?;
    }
    Ok(())
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Missing(field));
    }
    Ok(())
}

fn absolute_url(field: &'static str, value: &str) -> Result<(), ValidationError> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| ValidationError::InvalidUrl {
            field,
            reason: e.to_string(),
        })
}
