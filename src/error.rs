//! Top-level error type for starting and running the gateway.

use axum::http::header::InvalidHeaderName;
use thiserror::Error;

use crate::auth::KeyError;
use crate::config::ConfigError;
use crate::routing::RouteError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("route compilation failed: {0}")]
    Route(#[from] RouteError),

    #[error("token validator: {0}")]
    Key(#[from] KeyError),

    #[error("invalid refresh header name: {0}")]
    RefreshHeader(#[from] InvalidHeaderName),

    #[error("metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("invalid address '{address}': {source}")]
    Address {
        address: String,
        source: std::net::AddrParseError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
