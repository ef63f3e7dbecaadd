//! REST API handlers.
//!
//! Each handler reads/writes via the `ServiceStore` in `ApiState`.
//! Store failures are logged and answered with 500.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::{error, info, warn};

use svcreg_store::Service;

use crate::ApiState;
use crate::validate::validate_service;

/// Content type used for YAML bodies.
pub const YAML_CONTENT_TYPE: &str = "text/x-yaml";

/// Response wrapper for write endpoints.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
        .into_response()
}

fn yaml_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, YAML_CONTENT_TYPE)], body).into_response()
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// GET /spec
pub async fn spec(State(state): State<ApiState>) -> Response {
    match tokio::fs::read_to_string(state.spec_path.as_path()).await {
        Ok(body) => yaml_response(body),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = ?state.spec_path, "spec file not found");
            StatusCode::NOT_FOUND.into_response()
        }
        Err(e) => {
            error!(path = ?state.spec_path, error = %e, "failed to read spec file");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET /services
pub async fn list_services(State(state): State<ApiState>, headers: HeaderMap) -> Response {
    let services = match state.store.list() {
        Ok(services) => services,
        Err(e) => {
            error!(error = %e, "failed to list services");
            return error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    if wants_json(&headers) {
        return Json(services).into_response();
    }

    match serde_yaml::to_string(&services) {
        Ok(body) => yaml_response(body),
        Err(e) => {
            error!(error = %e, "failed to encode services as yaml");
            error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// POST /services
pub async fn register_service(
    State(state): State<ApiState>,
    payload: Result<Json<Service>, JsonRejection>,
) -> Response {
    let mut service = match payload {
        Ok(Json(service)) => service,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "undecodable service rejected");
            return error_response(&rejection.body_text(), StatusCode::BAD_REQUEST);
        }
    };

    if let Err(e) = validate_service(&service) {
        warn!(service_url = %service.service_url, error = %e, "invalid service rejected");
        return error_response(&e.to_string(), StatusCode::BAD_REQUEST);
    }

    // Freshness is derived by polling, never taken from clients.
    service.available = false;
    service.last_checked = None;
    service.last_available = None;

    match state.store.register(service.clone()) {
        Ok(()) => {
            info!(service_url = %service.service_url, "service registered");
            ApiResponse::ok(service).into_response()
        }
        Err(e) => {
            error!(service_url = %service.service_url, error = %e, "failed to register service");
            error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
