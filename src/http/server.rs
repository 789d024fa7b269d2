//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID)
//! - Bind server to listener
//! - Dispatch requests to the route table and filter chain
//! - Serve health, fallback and management endpoints
//! - Run the background health monitor until shutdown

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::admin;
use crate::auth::TokenValidator;
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::filters::FilterChain;
use crate::health::{HealthAggregator, HealthMonitor};
use crate::http::request::{has_dot_segments, strip_identity_headers, RequestContext};
use crate::http::response;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::proxy::Forwarder;
use crate::resilience::BreakerRegistry;
use crate::routing::Router as RouteTable;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub filters: Arc<FilterChain>,
    pub forwarder: Arc<Forwarder>,
    pub breakers: Arc<BreakerRegistry>,
    pub health: Arc<HealthAggregator>,
    pub admin_key: Option<Arc<str>>,
}

/// The gateway's HTTP front.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
    state: AppState,
}

impl GatewayServer {
    /// Build every subsystem from a validated configuration.
    pub fn new(config: GatewayConfig, validator: TokenValidator) -> Result<Self, GatewayError> {
        let routes = Arc::new(RouteTable::from_config(&config)?);
        let breakers = Arc::new(BreakerRegistry::with_breakers(
            config.circuit_breaker.clone(),
            routes.breaker_names(),
        ));
        let filters = Arc::new(FilterChain::new(validator, &config.auth)?);
        let forwarder = Arc::new(Forwarder::new(
            breakers.clone(),
            &config.timeouts,
            &config.retries,
            &config.security,
        ));
        let health = Arc::new(HealthAggregator::new(config.services.clone(), &config.health_check));

        tracing::info!(
            routes = routes.routes().len(),
            services = config.services.len(),
            breakers = breakers.len(),
            "Gateway initialized"
        );

        let state = AppState {
            routes,
            filters,
            forwarder,
            breakers,
            health,
            admin_key: config.admin.api_key.as_deref().map(Arc::from),
        };

        let router = Self::build_router(state.clone());
        Ok(Self { router, config, state })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/actuator/health", get(health_handler))
            .route("/fallback/{service}", any(fallback_handler))
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(state.clone())
            .merge(admin::setup_admin_router(state))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Gateway listening");

        if self.config.health_check.enabled {
            let monitor = HealthMonitor::new(self.state.health.clone(), self.config.health_check.clone());
            tokio::spawn(monitor.run(shutdown.clone()));
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.signalled().await })
            .await?;

        tracing::info!("Gateway stopped");
        Ok(())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Route, filter and forward one request.
async fn gateway_handler(State(state): State<AppState>, mut request: Request<Body>) -> Response {
    let ctx = RequestContext::from_request(&request);
    strip_identity_headers(request.headers_mut());

    if has_dot_segments(&ctx.path) {
        tracing::warn!(
            request_id = %ctx.request_id,
            method = %ctx.method,
            path = %ctx.path,
            "Rejected path with dot segments"
        );
        metrics::record_request(metrics::UNMATCHED_ROUTE, ctx.method.as_str(), 400, ctx.started);
        return response::error(StatusCode::BAD_REQUEST, "Path must not contain dot segments", &ctx.path);
    }

    let Some(route) = state.routes.match_route(&ctx.method, &ctx.path) else {
        tracing::warn!(
            request_id = %ctx.request_id,
            method = %ctx.method,
            path = %ctx.path,
            "No route matched"
        );
        metrics::record_request(metrics::UNMATCHED_ROUTE, ctx.method.as_str(), 404, ctx.started);
        return response::not_found(&ctx.path);
    };

    let forwarder = &state.forwarder;
    state
        .filters
        .execute(&ctx, &route, request, |request| forwarder.forward(&ctx, &route, request))
        .await
}

/// Aggregated downstream health: 200 when UP, 503 when DOWN.
async fn health_handler(State(state): State<AppState>) -> Response {
    let snapshot = state.health.aggregate().await;
    let status = if snapshot.is_up() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(snapshot)).into_response()
}

/// Fallback body served directly at its own URI.
async fn fallback_handler(Path(service): Path<String>, request: Request<Body>) -> Response {
    let path = request.uri().path();
    response::fallback(&service, path, path)
}
