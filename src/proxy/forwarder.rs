//! Upstream forwarding with breaker and retry.
//!
//! # Responsibilities
//! - Buffer the request body so attempts can be replayed
//! - Rewrite the URI onto the route's service base URL
//! - Gate every attempt through the route's circuit breaker
//! - Retry failed attempts with a fixed backoff
//! - Serve the fallback when the breaker denies an attempt
//! - Map exhausted failures to 502/504 or pass the last 5xx through
//!
//! # Design Decisions
//! - Breaker denial never consumes a retry and never touches the network
//! - Every admitted attempt resolves its permit before the next begins
//! - Routes without a resilience policy get exactly one attempt
//! - Only idempotent methods are retried; a POST that failed may still have
//!   had side effects on the backend

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body, Bytes},
    http::{request::Parts, uri::InvalidUri, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

use crate::config::{RetryConfig, SecurityConfig, TimeoutConfig};
use crate::http::request::{forwarded_headers, RequestContext, X_REQUEST_ID};
use crate::http::response;
use crate::observability::metrics;
use crate::resilience::{AttemptResult, BreakerRegistry, RetryPolicy};
use crate::routing::Route;

/// Errors that end a forwarding attempt without a backend response.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("upstream connection failed: {0}")]
    Connect(#[from] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),

    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("invalid upstream uri: {0}")]
    Uri(#[from] InvalidUri),

    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Connect(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::Uri(_) | ProxyError::Request(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn attempt_result(&self) -> AttemptResult {
        match self {
            ProxyError::Timeout(_) => AttemptResult::Timeout,
            _ => AttemptResult::ConnectError,
        }
    }

    fn into_error_response(self, path: &str) -> Response {
        response::error(self.status(), self.to_string(), path)
    }
}

/// Forwards matched requests to their backend.
#[derive(Debug)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    breakers: Arc<BreakerRegistry>,
    response_timeout: Duration,
    backoff: Duration,
    max_body_size: usize,
}

impl Forwarder {
    pub fn new(
        breakers: Arc<BreakerRegistry>,
        timeouts: &TimeoutConfig,
        retries: &RetryConfig,
        security: &SecurityConfig,
    ) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_millis(timeouts.connect_ms)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            breakers,
            response_timeout: Duration::from_millis(timeouts.response_ms),
            backoff: Duration::from_millis(retries.backoff_ms),
            max_body_size: security.max_body_size,
        }
    }

    /// Forward `request` to `route`'s backend.
    pub async fn forward(&self, ctx: &RequestContext, route: &Route, request: Request<Body>) -> Response {
        let (parts, body) = request.into_parts();

        let body = match to_bytes(body, self.max_body_size).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(request_id = %ctx.request_id, error = %e, "Failed to buffer request body");
                return ProxyError::BodyTooLarge { limit: self.max_body_size }.into_error_response(&ctx.path);
            }
        };

        let uri = match upstream_uri(route, &parts.uri) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::error!(request_id = %ctx.request_id, route = %route.id, error = %e, "Invalid upstream uri");
                return e.into_error_response(&ctx.path);
            }
        };

        let retry = match &route.resilience {
            Some(policy) if parts.method.is_idempotent() => RetryPolicy::new(policy.retries, self.backoff),
            _ => RetryPolicy::none(),
        };

        let mut attempt = 0;
        loop {
            attempt += 1;

            let upstream = match build_request(ctx, &parts, &uri, body.clone()) {
                Ok(req) => req,
                Err(e) => {
                    tracing::error!(request_id = %ctx.request_id, error = %e, "Failed to build upstream request");
                    return e.into_error_response(&ctx.path);
                }
            };

            let permit = match &route.resilience {
                Some(policy) => match self.breakers.admit(&policy.breaker) {
                    Some(permit) => Some(permit),
                    None => {
                        tracing::warn!(
                            request_id = %ctx.request_id,
                            breaker = %policy.breaker,
                            fallback = %policy.fallback,
                            "Circuit open, serving fallback"
                        );
                        metrics::record_fallback(&route.service);
                        return response::fallback(&route.service, &policy.fallback, &ctx.path);
                    }
                },
                None => None,
            };

            let result = self.send(upstream).await;
            let attempt_result = match &result {
                Ok(resp) => AttemptResult::Response(resp.status()),
                Err(e) => e.attempt_result(),
            };

            if let Some(permit) = permit {
                permit.record(attempt_result.outcome());
            }
            metrics::record_upstream_attempt(&route.service, &attempt_result);

            if retry.should_retry(attempt, &attempt_result) {
                tracing::info!(
                    request_id = %ctx.request_id,
                    route = %route.id,
                    attempt,
                    result = ?attempt_result,
                    delay = ?retry.backoff(),
                    "Retrying request"
                );
                tokio::time::sleep(retry.backoff()).await;
                continue;
            }

            return match result {
                Ok(upstream) => {
                    let (parts, body) = upstream.into_parts();
                    Response::from_parts(parts, Body::new(body)).into_response()
                }
                Err(e) => {
                    tracing::error!(
                        request_id = %ctx.request_id,
                        route = %route.id,
                        attempts = attempt,
                        error = %e,
                        "Upstream error"
                    );
                    e.into_error_response(&ctx.path)
                }
            };
        }
    }

    async fn send(&self, request: Request<Body>) -> Result<hyper::Response<Incoming>, ProxyError> {
        match tokio::time::timeout(self.response_timeout, self.client.request(request)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ProxyError::Timeout(self.response_timeout)),
        }
    }
}

/// Service base URL + request path + query.
pub fn upstream_uri(route: &Route, original: &Uri) -> Result<Uri, ProxyError> {
    let base = route.target.as_str().trim_end_matches('/');
    let path_and_query = original
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    Ok(format!("{}{}", base, path_and_query).parse::<Uri>()?)
}

fn build_request(ctx: &RequestContext, parts: &Parts, uri: &Uri, body: Bytes) -> Result<Request<Body>, ProxyError> {
    let mut request = Request::builder()
        .method(parts.method.clone())
        .uri(uri.clone())
        .body(Body::from(body))?;

    let headers = request.headers_mut();
    *headers = forwarded_headers(&parts.headers);
    if let Ok(value) = ctx.request_id.parse() {
        headers.insert(X_REQUEST_ID, value);
    }
    Ok(request)
}
