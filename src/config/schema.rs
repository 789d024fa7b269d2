//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on per-route retries.
pub const MAX_RETRIES: u32 = 3;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Token validation and header propagation settings.
    pub auth: AuthConfig,

    /// Backend services the gateway fronts.
    pub services: Vec<ServiceConfig>,

    /// Route definitions, evaluated in order.
    pub routes: Vec<RouteConfig>,

    /// Defaults shared by every circuit breaker.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Retry configuration.
    pub retries: RetryConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Request limits.
    pub security: SecurityConfig,

    /// Management endpoints.
    pub admin: AdminConfig,
}

impl GatewayConfig {
    /// Look up a service by name.
    pub fn service(&self, name: &str) -> Option<&ServiceConfig> {
        self.services.iter().find(|s| s.name == name)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Token validation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret used to verify bearer tokens. Required.
    pub jwt_secret: String,

    /// Paths that never require a token, merged into every route's own list.
    pub excluded_paths: Vec<String>,

    /// Cookie carrying the refresh token.
    pub refresh_cookie: String,

    /// Header the refresh token is copied into.
    pub refresh_header: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            excluded_paths: Vec::new(),
            refresh_cookie: "refresh-token".to_string(),
            refresh_header: "X-Refresh-Token".to_string(),
        }
    }
}

/// A backend service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Logical name, also the default breaker name.
    pub name: String,

    /// Base URL (e.g., "http://127.0.0.1:8081").
    pub url: String,
}

/// Filter identifiers understood by the filter registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterKind {
    Logging,
    Auth,
    RefreshTokenCookie,
}

/// Route configuration mapping requests to a service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub id: String,

    /// Path patterns; a trailing `**` segment matches one or more segments.
    pub paths: Vec<String>,

    /// Patterns that must not match, even if a `paths` entry does.
    #[serde(default)]
    pub exclude_paths: Vec<String>,

    /// Allowed methods. Empty means any method.
    #[serde(default)]
    pub methods: Vec<String>,

    /// Service name to forward to.
    pub service: String,

    /// Ordered filters applied to the request.
    #[serde(default)]
    pub filters: Vec<FilterKind>,

    /// Paths on this route that skip the auth filter.
    #[serde(default)]
    pub auth_excluded: Vec<String>,

    /// Circuit breaker and retry policy. Absent means plain pass-through.
    #[serde(default)]
    pub resilience: Option<ResilienceConfig>,
}

/// Per-route resilience policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResilienceConfig {
    /// Breaker name; routes sharing a name share a breaker.
    pub breaker: String,

    /// Retries after the first attempt.
    #[serde(default = "default_route_retries")]
    pub retries: u32,

    /// URI served when the breaker is open.
    pub fallback: String,
}

fn default_route_retries() -> u32 {
    MAX_RETRIES
}

/// Circuit breaker thresholds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Number of recent calls considered.
    pub sliding_window_size: usize,

    /// Calls required in the window before the failure rate is evaluated.
    pub minimum_calls: usize,

    /// Failure percentage that opens the circuit.
    pub failure_rate_threshold: f64,

    /// Trial calls admitted while half-open.
    pub half_open_calls: u32,

    /// Time spent open before trials are allowed, in milliseconds.
    pub wait_duration_ms: u64,
}

impl CircuitBreakerConfig {
    pub fn wait_duration(&self) -> Duration {
        Duration::from_millis(self.wait_duration_ms)
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            sliding_window_size: 10,
            minimum_calls: 5,
            failure_rate_threshold: 50.0,
            half_open_calls: 3,
            wait_duration_ms: 5_000,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Fixed delay between attempts in milliseconds.
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { backoff_ms: 50 }
    }
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in milliseconds.
    pub connect_ms: u64,

    /// Upstream response timeout in milliseconds.
    pub response_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: 2_000,
            response_ms: 5_000,
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Run the background health monitor.
    pub enabled: bool,

    /// Background check interval in seconds.
    pub interval_secs: u64,

    /// Per-probe timeout in milliseconds.
    pub timeout_ms: u64,

    /// Path probed on every service.
    pub path: String,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30,
            timeout_ms: 3_000,
            path: "/actuator/health".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum buffered request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Management endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AdminConfig {
    /// Bearer key guarding `/actuator/circuitbreakers` and
    /// `/actuator/gateway/routes`. Unset leaves them open.
    pub api_key: Option<String>,
}
