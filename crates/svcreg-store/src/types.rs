//! The service record.
//!
//! One `Service` describes one registered service. The service URL is the
//! primary key in every backend. The three freshness fields
//! (`available`, `last_checked`, `last_available`) are persisted as part of
//! the record but are only meaningful when a health-polling decorator
//! overlays them at read time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A registered service descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Base URL of the service. Unique key.
    #[serde(default)]
    pub service_url: String,
    /// Location of the service's machine-readable spec.
    #[serde(default)]
    pub spec_url: String,
    /// `null` on the wire reads as no tags.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
    /// Health-check endpoint. Empty means the service is never polled.
    #[serde(default)]
    pub healthcheck_url: String,
    /// Result of the most recent health poll.
    #[serde(rename = "health_confirmed", default)]
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_available: Option<DateTime<Utc>>,
}

impl Service {
    /// Key under which this record is stored.
    pub fn table_key(&self) -> &str {
        &self.service_url
    }

    /// Whether this service declares a health-check endpoint.
    pub fn is_monitored(&self) -> bool {
        !self.healthcheck_url.is_empty()
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> Service {
        Service {
            service_url: "http://orders.internal:8080".to_string(),
            spec_url: "http://orders.internal:8080/spec".to_string(),
            tags: vec!["orders".to_string(), "v2".to_string()],
            description: "order intake".to_string(),
            healthcheck_url: "http://orders.internal:8080/healthz".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn monitored_only_with_healthcheck_url() {
        let mut svc = test_service();
        assert!(svc.is_monitored());

        svc.healthcheck_url.clear();
        assert!(!svc.is_monitored());
    }

    #[test]
    fn table_key_is_service_url() {
        let svc = test_service();
        assert_eq!(svc.table_key(), "http://orders.internal:8080");
    }

    #[test]
    fn fresh_record_has_no_freshness() {
        let svc = test_service();
        assert!(!svc.available);
        assert!(svc.last_checked.is_none());
        assert!(svc.last_available.is_none());
    }

    #[test]
    fn null_tags_read_as_empty() {
        let svc: Service = serde_json::from_str(
            r#"{"service_url":"http://a","spec_url":"http://a/spec","description":"a","tags":null}"#,
        )
        .unwrap();
        assert!(svc.tags.is_empty());
    }

    #[test]
    fn missing_tags_read_as_empty() {
        let svc: Service =
            serde_json::from_str(r#"{"service_url":"http://a","description":"a"}"#).unwrap();
        assert!(svc.tags.is_empty());
    }

    #[test]
    fn present_tags_keep_order() {
        let svc: Service =
            serde_json::from_str(r#"{"service_url":"http://a","tags":["b","a"]}"#).unwrap();
        assert_eq!(svc.tags, vec!["b", "a"]);
    }
}
