//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, env overrides)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → compiled into Router, BreakerRegistry, HealthAggregator at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - A missing signing key is a validation error, so the process never serves

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AdminConfig, AuthConfig, CircuitBreakerConfig, FilterKind, GatewayConfig, HealthCheckConfig,
    ListenerConfig, ObservabilityConfig, ResilienceConfig, RetryConfig, RouteConfig,
    SecurityConfig, ServiceConfig, TimeoutConfig, MAX_RETRIES,
};
