//! Filter chain executor.
//!
//! # Responsibilities
//! - Resolve a route's filter ids against the registry
//! - Run request hooks in declared order until one short-circuits
//! - Hand the final request to the terminal forwarder
//! - Run completion hooks for entered filters in reverse order
//! - Record request metrics around the whole chain
//!
//! # Design Decisions
//! - Filters take the request by value and hand back a new one, so a rewrite
//!   can never leave a half-modified request behind
//! - Filter hooks are synchronous; the only suspension point is the forwarder
//! - Composition is data: routes name filters, the registry owns them

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header::InvalidHeaderName, Request},
    response::Response,
};

use crate::auth::TokenValidator;
use crate::config::{AuthConfig, FilterKind};
use crate::filters::{
    auth::AuthFilter, logging::LoggingFilter, refresh_cookie::RefreshCookieFilter, FilterAction,
    GatewayFilter,
};
use crate::http::request::RequestContext;
use crate::observability::metrics;
use crate::routing::Route;

/// Filter registry plus executor.
pub struct FilterChain {
    filters: HashMap<FilterKind, Arc<dyn GatewayFilter>>,
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&'static str> = self.filters.values().map(|f| f.name()).collect();
        names.sort_unstable();
        f.debug_struct("FilterChain").field("filters", &names).finish()
    }
}

impl FilterChain {
    /// Registry holding every built-in filter.
    pub fn new(validator: TokenValidator, auth: &AuthConfig) -> Result<Self, InvalidHeaderName> {
        let mut chain = Self::empty();
        chain.register(FilterKind::Logging, Arc::new(LoggingFilter));
        chain.register(FilterKind::Auth, Arc::new(AuthFilter::new(validator)));
        chain.register(
            FilterKind::RefreshTokenCookie,
            Arc::new(RefreshCookieFilter::new(&auth.refresh_cookie, &auth.refresh_header)?),
        );
        Ok(chain)
    }

    pub fn empty() -> Self {
        Self {
            filters: HashMap::new(),
        }
    }

    pub fn register(&mut self, kind: FilterKind, filter: Arc<dyn GatewayFilter>) {
        self.filters.insert(kind, filter);
    }

    /// Run `route`'s filters around `forward`.
    pub async fn execute<F, Fut>(
        &self,
        ctx: &RequestContext,
        route: &Route,
        request: Request<Body>,
        forward: F,
    ) -> Response
    where
        F: FnOnce(Request<Body>) -> Fut,
        Fut: Future<Output = Response>,
    {
        let mut entered: Vec<Arc<dyn GatewayFilter>> = Vec::with_capacity(route.filters.len());

        let response = match self.apply_request_filters(ctx, route, request, &mut entered) {
            FilterAction::Continue(request) => forward(request).await,
            FilterAction::Respond(response) => response,
        };

        for filter in entered.iter().rev() {
            filter.on_response(ctx, route, &response);
        }

        metrics::record_request(&route.id, ctx.method.as_str(), response.status().as_u16(), ctx.started);
        response
    }

    fn apply_request_filters(
        &self,
        ctx: &RequestContext,
        route: &Route,
        mut request: Request<Body>,
        entered: &mut Vec<Arc<dyn GatewayFilter>>,
    ) -> FilterAction {
        for kind in &route.filters {
            let Some(filter) = self.filters.get(kind) else {
                tracing::warn!(route = %route.id, filter = ?kind, "Filter not registered, skipping");
                continue;
            };
            entered.push(Arc::clone(filter));

            match filter.on_request(ctx, route, request) {
                FilterAction::Continue(next) => request = next,
                respond @ FilterAction::Respond(_) => {
                    tracing::debug!(route = %route.id, filter = filter.name(), "Filter short-circuited request");
                    return respond;
                }
            }
        }
        FilterAction::Continue(request)
    }
}
