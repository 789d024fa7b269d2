//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (routes reference existing services)
//! - Validate value ranges (breaker thresholds, retry cap)
//! - Reject path patterns the matcher cannot evaluate
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use axum::http::{HeaderName, Method};
use thiserror::Error;
use url::Url;

use crate::config::schema::{FilterKind, GatewayConfig, MAX_RETRIES};
use crate::routing::matcher::PathPattern;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("auth.jwt_secret is not configured")]
    MissingJwtSecret,

    #[error("auth.refresh_header '{0}' is not a valid header name")]
    InvalidRefreshHeader(String),

    #[error("service '{0}' is defined more than once")]
    DuplicateService(String),

    #[error("service '{name}' has invalid url '{url}'")]
    InvalidServiceUrl { name: String, url: String },

    #[error("route '{0}' is defined more than once")]
    DuplicateRoute(String),

    #[error("route '{route}' references unknown service '{service}'")]
    UnknownService { route: String, service: String },

    #[error("route '{0}' has no path patterns")]
    EmptyPaths(String),

    #[error("route '{route}' has invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        route: String,
        pattern: String,
        reason: String,
    },

    #[error("route '{route}' has invalid method '{method}'")]
    InvalidMethod { route: String, method: String },

    #[error("route '{route}' retries {retries} exceeds the cap of {}", MAX_RETRIES)]
    TooManyRetries { route: String, retries: u32 },

    #[error("route '{0}' has an empty breaker name")]
    EmptyBreakerName(String),

    #[error("circuit breaker setting invalid: {0}")]
    InvalidBreakerSetting(&'static str),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.auth.jwt_secret.trim().is_empty() {
        errors.push(ValidationError::MissingJwtSecret);
    }
    if HeaderName::from_bytes(config.auth.refresh_header.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidRefreshHeader(config.auth.refresh_header.clone()));
    }

    let mut service_names = HashSet::new();
    for service in &config.services {
        if !service_names.insert(service.name.as_str()) {
            errors.push(ValidationError::DuplicateService(service.name.clone()));
        }
        if Url::parse(&service.url).is_err() {
            errors.push(ValidationError::InvalidServiceUrl {
                name: service.name.clone(),
                url: service.url.clone(),
            });
        }
    }

    let mut route_ids = HashSet::new();
    for route in &config.routes {
        if !route_ids.insert(route.id.as_str()) {
            errors.push(ValidationError::DuplicateRoute(route.id.clone()));
        }
        if !service_names.contains(route.service.as_str()) {
            errors.push(ValidationError::UnknownService {
                route: route.id.clone(),
                service: route.service.clone(),
            });
        }
        if route.paths.is_empty() {
            errors.push(ValidationError::EmptyPaths(route.id.clone()));
        }

        let auth_patterns: Vec<&String> = if route.filters.contains(&FilterKind::Auth) {
            route.auth_excluded.iter().chain(config.auth.excluded_paths.iter()).collect()
        } else {
            Vec::new()
        };
        for pattern in route.paths.iter().chain(&route.exclude_paths).chain(auth_patterns) {
            if let Err(reason) = PathPattern::parse(pattern) {
                errors.push(ValidationError::InvalidPattern {
                    route: route.id.clone(),
                    pattern: pattern.clone(),
                    reason: reason.to_string(),
                });
            }
        }

        for method in &route.methods {
            if Method::from_bytes(method.to_uppercase().as_bytes()).is_err() {
                errors.push(ValidationError::InvalidMethod {
                    route: route.id.clone(),
                    method: method.clone(),
                });
            }
        }

        if let Some(policy) = &route.resilience {
            if policy.retries > MAX_RETRIES {
                errors.push(ValidationError::TooManyRetries {
                    route: route.id.clone(),
                    retries: policy.retries,
                });
            }
            if policy.breaker.trim().is_empty() {
                errors.push(ValidationError::EmptyBreakerName(route.id.clone()));
            }
        }
    }

    let breaker = &config.circuit_breaker;
    if breaker.sliding_window_size == 0 {
        errors.push(ValidationError::InvalidBreakerSetting("sliding_window_size must be > 0"));
    }
    if breaker.minimum_calls == 0 {
        errors.push(ValidationError::InvalidBreakerSetting("minimum_calls must be > 0"));
    }
    if !(breaker.failure_rate_threshold > 0.0 && breaker.failure_rate_threshold <= 100.0) {
        errors.push(ValidationError::InvalidBreakerSetting(
            "failure_rate_threshold must be in (0, 100]",
        ));
    }
    if breaker.half_open_calls == 0 {
        errors.push(ValidationError::InvalidBreakerSetting("half_open_calls must be > 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
