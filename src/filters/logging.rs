//! Request/response logging filter.

use axum::{
    body::Body,
    http::{header, HeaderMap, Request},
    response::Response,
};

use crate::filters::{FilterAction, GatewayFilter};
use crate::http::request::RequestContext;
use crate::routing::Route;

/// Headers whose values never reach the logs.
const REDACTED: [header::HeaderName; 3] = [header::AUTHORIZATION, header::COOKIE, header::PROXY_AUTHORIZATION];

pub struct LoggingFilter;

impl GatewayFilter for LoggingFilter {
    fn name(&self) -> &'static str {
        "logging"
    }

    fn on_request(&self, ctx: &RequestContext, route: &Route, request: Request<Body>) -> FilterAction {
        tracing::info!(
            request_id = %ctx.request_id,
            method = %ctx.method,
            path = %ctx.path,
            route = %route.id,
            "Request received"
        );
        tracing::debug!(request_id = %ctx.request_id, headers = ?loggable_headers(request.headers()), "Request headers");
        FilterAction::Continue(request)
    }

    fn on_response(&self, ctx: &RequestContext, route: &Route, response: &Response) {
        tracing::info!(
            request_id = %ctx.request_id,
            route = %route.id,
            status = response.status().as_u16(),
            duration_ms = ctx.started.elapsed().as_millis() as u64,
            "Request completed"
        );
    }
}

fn loggable_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if REDACTED.contains(name) {
                "<redacted>".to_string()
            } else {
                value.to_str().unwrap_or("<binary>").to_string()
            };
            (name.as_str().to_string(), value)
        })
        .collect()
}
