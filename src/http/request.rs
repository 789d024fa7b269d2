//! Request handling and transformation.
//!
//! # Responsibilities
//! - Capture per-request identity (request id, method, path, start time)
//! - Prepare header maps for forwarding to a backend
//! - Drop client-supplied identity headers on ingress
//! - Detect dot segments that a backend could resolve differently
//!
//! # Design Decisions
//! - Request ID assigned by `SetRequestIdLayer` before any handler runs
//! - Hop-by-hop headers never cross the gateway
//! - `Host` is dropped so the client derives it from the backend URI

use std::time::Instant;

use axum::http::{header, HeaderMap, HeaderName, Method, Request};
use uuid::Uuid;

/// Request ID header name.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Identity headers; only the auth filter may set them.
pub const X_MEMBER_ID: &str = "x-member-id";
pub const X_ROLE: &str = "x-role";

/// Headers scoped to a single connection.
const HOP_BY_HOP: [HeaderName; 6] = [
    header::CONNECTION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::PROXY_AUTHORIZATION,
];

/// Identity of one inbound request, shared by the filters and the forwarder.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub method: Method,
    pub path: String,
    pub started: Instant,
}

impl RequestContext {
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let request_id = request
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Self {
            request_id,
            method: request.method().clone(),
            path: request.uri().path().to_string(),
            started: Instant::now(),
        }
    }
}

/// Copy of `headers` fit for an upstream request.
pub fn forwarded_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = headers.clone();
    for name in HOP_BY_HOP.iter() {
        out.remove(name);
    }
    out.remove("keep-alive");
    out.remove("proxy-connection");
    out.remove(header::HOST);
    out
}

/// Remove identity headers sent by the client.
pub fn strip_identity_headers(headers: &mut HeaderMap) {
    headers.remove(X_MEMBER_ID);
    headers.remove(X_ROLE);
}

/// Whether `path` holds a `.` or `..` segment, plain or percent-encoded.
///
/// Encoded slashes and backslashes count as separators, since backends may
/// decode them before resolving the path.
pub fn has_dot_segments(path: &str) -> bool {
    path.split('/').any(|segment| {
        let decoded = segment
            .to_ascii_lowercase()
            .replace("%2e", ".")
            .replace("%2f", "/")
            .replace("%5c", "/")
            .replace('\\', "/");
        decoded.split('/').any(|part| part == "." || part == "..")
    })
}
