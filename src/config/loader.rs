//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable that overrides `auth.jwt_secret`.
pub const JWT_SECRET_ENV: &str = "GATEWAY_JWT_SECRET";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config = parse_config(&content)?;

    if let Ok(secret) = std::env::var(JWT_SECRET_ENV) {
        if !secret.is_empty() {
            config.auth.jwt_secret = secret;
        }
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse configuration text without validating it.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::FilterKind;

    #[test]
    fn test_parse_minimal_route() {
        let config = parse_config(
            r#"
            [auth]
            jwt_secret = "secret"

            [[services]]
            name = "user-service"
            url = "http://127.0.0.1:8081"

            [[routes]]
            id = "user"
            paths = ["/user/**"]
            service = "user-service"
            filters = ["logging", "auth"]
            "#,
        )
        .unwrap();

        assert_eq!(config.routes.len(), 1);
        assert_eq!(config.routes[0].filters, vec![FilterKind::Logging, FilterKind::Auth]);
        assert!(config.routes[0].resilience.is_none());
        assert_eq!(config.circuit_breaker.sliding_window_size, 10);
        assert_eq!(config.health_check.path, "/actuator/health");
    }

    #[test]
    fn test_parse_resilience_defaults_retries() {
        let config = parse_config(
            r#"
            [[routes]]
            id = "live"
            paths = ["/live-lecture/**"]
            service = "live-lecture-service"

            [routes.resilience]
            breaker = "live-lecture-service"
            fallback = "/fallback/live-lecture"
            "#,
        )
        .unwrap();

        let policy = config.routes[0].resilience.as_ref().unwrap();
        assert_eq!(policy.retries, 3);
        assert_eq!(policy.fallback, "/fallback/live-lecture");
    }

    #[test]
    fn test_unknown_filter_rejected() {
        let result = parse_config(
            r#"
            [[routes]]
            id = "x"
            paths = ["/x"]
            service = "s"
            filters = ["cache"]
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
