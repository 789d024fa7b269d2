//! Bearer token enforcement.
//!
//! # Responsibilities
//! - Let auth-excluded paths through untouched
//! - Validate the `Authorization` header for everything else
//! - Propagate identity downstream as `X-Member-Id` and `X-Role`
//! - Reject with a JSON 401 naming the token status
//!
//! # Design Decisions
//! - Identity headers are inserted, replacing anything the client sent
//! - Client copies are already stripped on ingress, so excluded paths
//!   forward no identity at all
//! - Rejections are final; nothing downstream is contacted

use axum::{
    body::Body,
    http::{header, header::InvalidHeaderValue, HeaderValue, Request},
};

use crate::auth::{Claims, TokenStatus, TokenValidator, ValidationOutcome};
use crate::filters::{FilterAction, GatewayFilter};
use crate::http::request::{RequestContext, X_MEMBER_ID, X_ROLE};
use crate::http::response;
use crate::observability::metrics;
use crate::routing::Route;

pub struct AuthFilter {
    validator: TokenValidator,
}

impl AuthFilter {
    pub fn new(validator: TokenValidator) -> Self {
        Self { validator }
    }
}

impl GatewayFilter for AuthFilter {
    fn name(&self) -> &'static str {
        "auth"
    }

    fn on_request(&self, ctx: &RequestContext, route: &Route, request: Request<Body>) -> FilterAction {
        if route.is_auth_excluded(&ctx.path) {
            tracing::debug!(request_id = %ctx.request_id, path = %ctx.path, "Path excluded from authentication");
            return FilterAction::Continue(request);
        }

        let authorization = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        match self.validator.validate(authorization) {
            ValidationOutcome::Valid(claims) => match propagate_claims(request, &claims) {
                Ok(request) => FilterAction::Continue(request),
                Err(e) => {
                    tracing::error!(
                        request_id = %ctx.request_id,
                        member_id = claims.id,
                        error = %e,
                        "Failed to propagate token claims"
                    );
                    FilterAction::Respond(response::auth_failure(
                        &ctx.path,
                        "Token claims could not be forwarded",
                    ))
                }
            },
            outcome => {
                let status = outcome.rejection().unwrap_or(TokenStatus::Invalid);
                tracing::warn!(
                    request_id = %ctx.request_id,
                    path = %ctx.path,
                    status = %status,
                    "Request rejected by auth filter"
                );
                metrics::record_auth_rejection(status);
                FilterAction::Respond(response::auth_rejected(status, &ctx.path))
            }
        }
    }
}

fn propagate_claims(mut request: Request<Body>, claims: &Claims) -> Result<Request<Body>, InvalidHeaderValue> {
    let member_id = HeaderValue::from_str(&claims.id.to_string())?;
    let role = HeaderValue::from_str(&claims.role)?;

    let headers = request.headers_mut();
    headers.insert(X_MEMBER_ID, member_id);
    headers.insert(X_ROLE, role);
    Ok(request)
}
