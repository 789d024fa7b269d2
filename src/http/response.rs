//! Gateway-generated responses.
//!
//! # Responsibilities
//! - Build the JSON bodies the gateway answers with itself (404, 401,
//!   fallback, upstream errors)
//! - Stamp every body with an RFC 3339 timestamp and the request path
//!
//! # Design Decisions
//! - Backend responses pass through untouched; only gateway-originated
//!   responses are built here
//! - Fallback responses carry `X-Gateway-Fallback` so clients can tell them
//!   apart from a backend's own 503
//! - Backend timeouts result in 504 Gateway Timeout

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::TokenStatus;

/// Marks a response as served by a fallback.
pub const X_GATEWAY_FALLBACK: &str = "x-gateway-fallback";

fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Body of a 401/500 raised by the auth filter.
#[derive(Debug, Serialize)]
pub struct AuthErrorBody {
    pub timestamp: String,
    pub status: TokenStatus,
    pub error: &'static str,
    pub message: String,
    pub path: String,
}

/// Body for errors identified by HTTP status alone.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub timestamp: String,
    pub status: u16,
    pub error: &'static str,
    pub message: String,
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct FallbackBody {
    pub timestamp: String,
    pub status: &'static str,
    pub service: String,
    pub message: String,
    pub path: String,
}

/// Token rejected: 401 with the token status.
pub fn auth_rejected(status: TokenStatus, path: &str) -> Response {
    let body = AuthErrorBody {
        timestamp: timestamp(),
        status,
        error: "Unauthorized",
        message: status.message().to_string(),
        path: path.to_string(),
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

/// Claims could not be propagated: 500 with status `INVALID`.
pub fn auth_failure(path: &str, message: impl Into<String>) -> Response {
    let body = AuthErrorBody {
        timestamp: timestamp(),
        status: TokenStatus::Invalid,
        error: "Internal Server Error",
        message: message.into(),
        path: path.to_string(),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

/// JSON error keyed by HTTP status.
pub fn error(status: StatusCode, message: impl Into<String>, path: &str) -> Response {
    let body = ErrorBody {
        timestamp: timestamp(),
        status: status.as_u16(),
        error: status.canonical_reason().unwrap_or("Error"),
        message: message.into(),
        path: path.to_string(),
    };
    (status, Json(body)).into_response()
}

pub fn not_found(path: &str) -> Response {
    error(StatusCode::NOT_FOUND, "No route matches the request", path)
}

/// Degraded response served when a backend's circuit is open.
pub fn fallback(service: &str, fallback_uri: &str, path: &str) -> Response {
    let body = FallbackBody {
        timestamp: timestamp(),
        status: "FALLBACK",
        service: service.to_string(),
        message: format!("{} is temporarily unavailable, please try again later", service),
        path: path.to_string(),
    };
    let mut response = (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response();
    if let Ok(value) = HeaderValue::from_str(fallback_uri) {
        response.headers_mut().insert(X_GATEWAY_FALLBACK, value);
    }
    response
}
