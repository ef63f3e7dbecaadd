//! HTML listing of registered services.
//!
//! Renders the same data as `GET /services` as a table, with freshness
//! shown relative to now ("12s ago", "never").

use askama::Template;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use chrono::{DateTime, Utc};
use tracing::error;

use svcreg_store::Service;

use crate::ApiState;

/// One table row, pre-formatted for the template.
pub struct ServiceRow {
    pub service_url: String,
    pub spec_url: String,
    pub description: String,
    pub tags: String,
    pub available: bool,
    pub last_checked: String,
    pub last_available: String,
}

impl ServiceRow {
    pub fn from_service(service: &Service, now: DateTime<Utc>) -> Self {
        Self {
            service_url: service.service_url.clone(),
            spec_url: service.spec_url.clone(),
            description: service.description.clone(),
            tags: service.tags.join(","),
            available: service.available,
            last_checked: format_ago(service.last_checked, now),
            last_available: format_ago(service.last_available, now),
        }
    }
}

/// "never" for absent timestamps, otherwise whole seconds elapsed.
fn format_ago(at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match at {
        None => "never".to_string(),
        Some(at) => {
            let secs = (now - at).num_seconds().max(0) as u64;
            format!(
                "{} ago",
                humantime::format_duration(std::time::Duration::from_secs(secs))
            )
        }
    }
}

#[derive(Template)]
#[template(path = "services.html")]
struct ServicesTemplate {
    rows: Vec<ServiceRow>,
}

fn render<T: Template>(tmpl: T) -> Html<String> {
    Html(tmpl.render().unwrap_or_else(|e| {
        format!("<pre>Template error: {e}</pre>")
    }))
}

/// GET /services.html
pub async fn services_page(State(state): State<ApiState>) -> Response {
    let services = match state.store.list() {
        Ok(services) => services,
        Err(e) => {
            error!(error = %e, "failed to list services for page");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let now = Utc::now();
    let mut rows: Vec<ServiceRow> = services
        .iter()
        .map(|s| ServiceRow::from_service(s, now))
        .collect();
    rows.sort_by(|a, b| a.service_url.cmp(&b.service_url));

    render(ServicesTemplate { rows }).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    use svcreg_store::{MemoryStore, ServiceStore};

    #[test]
    fn format_ago_never() {
        assert_eq!(format_ago(None, Utc::now()), "never");
    }

    #[test]
    fn format_ago_seconds() {
        let now = Utc::now();
        let at = now - chrono::Duration::seconds(90);
        assert_eq!(format_ago(Some(at), now), "1m 30s ago");
    }

    #[test]
    fn format_ago_clamps_future() {
        let now = Utc::now();
        let at = now + chrono::Duration::seconds(5);
        assert_eq!(format_ago(Some(at), now), "0s ago");
    }

    #[test]
    fn row_joins_tags() {
        let svc = Service {
            service_url: "http://a".to_string(),
            tags: vec!["x".to_string(), "y".to_string()],
            ..Default::default()
        };
        let row = ServiceRow::from_service(&svc, Utc::now());
        assert_eq!(row.tags, "x,y");
        assert_eq!(row.last_checked, "never");
    }

    #[tokio::test]
    async fn page_lists_services_escaped() {
        let store = Arc::new(MemoryStore::new());
        store
            .register(Service {
                service_url: "http://catalog".to_string(),
                spec_url: "http://catalog/spec".to_string(),
                description: "<b>catalog</b>".to_string(),
                ..Default::default()
            })
            .unwrap();
        let state = ApiState {
            store,
            spec_path: Arc::new(PathBuf::from("spec.yml")),
        };

        let resp = services_page(State(state)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("http://catalog"));
        assert!(html.contains("&lt;b&gt;catalog&lt;/b&gt;"));
        assert!(html.contains("never"));
    }
}
