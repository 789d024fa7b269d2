//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Compile route configs into immutable routes
//! - Look up matching route for request
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in configuration order (acceptable for typical route counts)
//! - First match wins; public routes are listed before protected ones
//! - Explicit NoMatch rather than silent default

use std::sync::Arc;

use axum::http::Method;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::config::schema::{FilterKind, GatewayConfig, RouteConfig, MAX_RETRIES};
use crate::routing::matcher::{Matcher, MethodMatcher, PathMatcher, PatternError, PatternSet};

/// Errors raised while compiling routes.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route '{route}': {source}")]
    Pattern { route: String, source: PatternError },

    #[error("route '{route}': unknown service '{service}'")]
    UnknownService { route: String, service: String },

    #[error("route '{route}': invalid service url: {source}")]
    Url { route: String, source: url::ParseError },

    #[error("route '{route}': invalid method '{method}'")]
    Method { route: String, method: String },
}

/// Circuit breaker and retry settings attached to a route.
#[derive(Debug, Clone, Serialize)]
pub struct ResiliencePolicy {
    pub breaker: String,
    pub retries: u32,
    pub fallback: String,
}

/// A compiled route.
#[derive(Debug)]
pub struct Route {
    pub id: String,
    pub service: String,
    pub target: Url,
    pub filters: Vec<FilterKind>,
    pub auth_excluded: PatternSet,
    pub resilience: Option<ResiliencePolicy>,
    methods: MethodMatcher,
    paths: PathMatcher,
}

impl Route {
    /// Compile a route against its service's base URL.
    ///
    /// `global_auth_excluded` is merged into the route's own excluded paths.
    pub fn compile(
        config: &RouteConfig,
        service_url: &str,
        global_auth_excluded: &[String],
    ) -> Result<Self, RouteError> {
        let pattern_err = |source: PatternError| RouteError::Pattern {
            route: config.id.clone(),
            source,
        };

        let paths = PathMatcher::new(
            PatternSet::parse(&config.paths).map_err(pattern_err)?,
            PatternSet::parse(&config.exclude_paths).map_err(pattern_err)?,
        );

        let methods = config
            .methods
            .iter()
            .map(|m| {
                Method::from_bytes(m.to_uppercase().as_bytes()).map_err(|_| RouteError::Method {
                    route: config.id.clone(),
                    method: m.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let auth_excluded: Vec<&String> = config
            .auth_excluded
            .iter()
            .chain(global_auth_excluded.iter())
            .collect();

        let target = Url::parse(service_url).map_err(|source| RouteError::Url {
            route: config.id.clone(),
            source,
        })?;

        Ok(Self {
            id: config.id.clone(),
            service: config.service.clone(),
            target,
            filters: config.filters.clone(),
            auth_excluded: PatternSet::parse(&auth_excluded).map_err(pattern_err)?,
            resilience: config.resilience.as_ref().map(|r| ResiliencePolicy {
                breaker: r.breaker.clone(),
                retries: r.retries.min(MAX_RETRIES),
                fallback: r.fallback.clone(),
            }),
            methods: MethodMatcher::new(methods),
            paths,
        })
    }

    /// True if the path skips the auth filter on this route.
    pub fn is_auth_excluded(&self, path: &str) -> bool {
        self.auth_excluded.contains(path)
    }

    /// Serializable description for the management API.
    pub fn summary(&self) -> RouteSummary {
        RouteSummary {
            id: self.id.clone(),
            paths: self.paths.include().iter().map(|p| p.as_str().to_string()).collect(),
            exclude_paths: self.paths.exclude().iter().map(|p| p.as_str().to_string()).collect(),
            methods: self.methods.allowed(),
            service: self.service.clone(),
            target: self.target.to_string(),
            filters: self.filters.clone(),
            resilience: self.resilience.clone(),
        }
    }
}

impl Matcher for Route {
    fn matches(&self, method: &Method, path: &str) -> bool {
        self.methods.matches(method, path) && self.paths.matches(method, path)
    }
}

/// Route description returned by `/actuator/gateway/routes`.
#[derive(Debug, Clone, Serialize)]
pub struct RouteSummary {
    pub id: String,
    pub paths: Vec<String>,
    pub exclude_paths: Vec<String>,
    pub methods: Vec<String>,
    pub service: String,
    pub target: String,
    pub filters: Vec<FilterKind>,
    pub resilience: Option<ResiliencePolicy>,
}

/// The route table.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Arc<Route>>,
}

impl Router {
    /// Build a router from configuration, preserving route order.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, RouteError> {
        let routes = config
            .routes
            .iter()
            .map(|route| {
                let service = config.service(&route.service).ok_or_else(|| {
                    RouteError::UnknownService {
                        route: route.id.clone(),
                        service: route.service.clone(),
                    }
                })?;
                Route::compile(route, &service.url, &config.auth.excluded_paths).map(Arc::new)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { routes })
    }

    /// Find the first route matching the method and path.
    pub fn match_route(&self, method: &Method, path: &str) -> Option<Arc<Route>> {
        self.routes
            .iter()
            .find(|route| route.matches(method, path))
            .cloned()
    }

    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    /// Distinct breaker names referenced by any route.
    pub fn breaker_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .routes
            .iter()
            .filter_map(|r| r.resilience.as_ref().map(|p| p.breaker.clone()))
            .collect();
        names.sort();
        names.dedup();
        names
    }
}
