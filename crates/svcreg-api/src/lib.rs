//! svcreg-api — REST API for svcreg.
//!
//! Provides the axum router in front of a [`ServiceStore`]. Inbound
//! records are validated here; the store never re-validates.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/health` | Liveness of the registry itself |
//! | GET | `/spec` | The registry's own API spec (YAML) |
//! | GET | `/services` | List services (JSON with `Accept: application/json`, YAML otherwise) |
//! | POST | `/services` | Register or overwrite a service |
//! | GET | `/services.html` | HTML table of services |
//!
//! Every route gets `Access-Control-Allow-Origin: *` and a latency log line.

pub mod handlers;
pub mod page;
pub mod validate;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use svcreg_store::ServiceStore;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<dyn ServiceStore>,
    /// File served at `/spec`.
    pub spec_path: Arc<PathBuf>,
}

/// Build the complete API router.
pub fn build_router(store: Arc<dyn ServiceStore>, spec_path: impl Into<PathBuf>) -> Router {
    let state = ApiState {
        store,
        spec_path: Arc::new(spec_path.into()),
    };

    Router::new()
        .route("/health", get(handlers::health))
        .route("/spec", get(handlers::spec))
        .route(
            "/services",
            get(handlers::list_services).post(handlers::register_service),
        )
        .route("/services.html", get(page::services_page))
        .with_state(state)
        .layer(middleware::from_fn(log_latency))
        .layer(CorsLayer::new().allow_origin(Any))
}

/// Log method, URI, status and wall-clock latency of every request.
async fn log_latency(req: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();

    let resp = next.run(req).await;

    info!(
        latency = started.elapsed().as_secs_f64(),
        %method,
        %uri,
        status = resp.status().as_u16(),
        "request handled"
    );
    resp
}
