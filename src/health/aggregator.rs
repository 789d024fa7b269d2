//! Downstream health aggregation.
//!
//! # Responsibilities
//! - Probe every configured service's health endpoint concurrently
//! - Bound each probe by its own timeout
//! - Fold the results into one UP/DOWN snapshot
//!
//! # Design Decisions
//! - No state between calls; every aggregation probes afresh
//! - Never fails: unreachable or slow services become DOWN entries
//! - Overall status is UP only when every service is UP

use std::collections::BTreeMap;
use std::time::Duration;

use axum::{body::Body, http::Request};
use futures_util::future::join_all;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde::Serialize;

use crate::config::{HealthCheckConfig, ServiceConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Up,
    Down,
}

/// One service's probe result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceHealth {
    pub status: HealthStatus,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ServiceHealth {
    fn up(url: String) -> Self {
        Self {
            status: HealthStatus::Up,
            url,
            detail: None,
        }
    }

    fn down(url: String, detail: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Down,
            url,
            detail: Some(detail.into()),
        }
    }

    pub fn is_up(&self) -> bool {
        self.status == HealthStatus::Up
    }
}

/// Aggregated health report.
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub status: HealthStatus,
    pub services: BTreeMap<String, ServiceHealth>,
}

impl HealthSnapshot {
    fn from_services(services: BTreeMap<String, ServiceHealth>) -> Self {
        let status = if services.values().all(ServiceHealth::is_up) {
            HealthStatus::Up
        } else {
            HealthStatus::Down
        };
        Self { status, services }
    }

    pub fn is_up(&self) -> bool {
        self.status == HealthStatus::Up
    }
}

#[derive(Debug)]
pub struct HealthAggregator {
    client: Client<HttpConnector, Body>,
    services: Vec<ServiceConfig>,
    path: String,
    timeout: Duration,
}

impl HealthAggregator {
    pub fn new(services: Vec<ServiceConfig>, config: &HealthCheckConfig) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            client,
            services,
            path: config.path.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    pub fn services(&self) -> &[ServiceConfig] {
        &self.services
    }

    /// Probe every service and combine the results.
    pub async fn aggregate(&self) -> HealthSnapshot {
        let probes = self.services.iter().map(|service| async move {
            (service.name.clone(), self.probe(service).await)
        });
        let results = join_all(probes).await;
        HealthSnapshot::from_services(results.into_iter().collect())
    }

    async fn probe(&self, service: &ServiceConfig) -> ServiceHealth {
        let url = format!("{}{}", service.url.trim_end_matches('/'), self.path);

        let request = match Request::get(url.as_str())
            .header("user-agent", "edge-gateway-health-check")
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => return ServiceHealth::down(url, format!("invalid health url: {}", e)),
        };

        match tokio::time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) if response.status().is_success() => ServiceHealth::up(url),
            Ok(Ok(response)) => {
                let status = response.status().as_u16();
                tracing::debug!(service = %service.name, status, "Health probe returned non-success status");
                ServiceHealth::down(url, format!("status {}", status))
            }
            Ok(Err(e)) => {
                tracing::debug!(service = %service.name, error = %e, "Health probe connection error");
                ServiceHealth::down(url, e.to_string())
            }
            Err(_) => ServiceHealth::down(url, format!("timeout after {}ms", self.timeout.as_millis())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    use axum::{http::StatusCode, routing::get, Router};
    use tokio::net::TcpListener;

    async fn serve(app: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn service(name: &str, addr: SocketAddr) -> ServiceConfig {
        ServiceConfig {
            name: name.into(),
            url: format!("http://{}", addr),
        }
    }

    fn config(timeout_ms: u64) -> HealthCheckConfig {
        HealthCheckConfig {
            timeout_ms,
            ..HealthCheckConfig::default()
        }
    }

    #[tokio::test]
    async fn test_all_up() {
        let addr = serve(Router::new().route("/actuator/health", get(|| async { "{\"status\":\"UP\"}" }))).await;
        let aggregator = HealthAggregator::new(
            vec![service("user-service", addr), service("signaling-service", addr)],
            &config(1_000),
        );

        let snapshot = aggregator.aggregate().await;
        assert!(snapshot.is_up());
        assert_eq!(snapshot.services.len(), 2);
    }

    #[tokio::test]
    async fn test_one_down_makes_overall_down() {
        let healthy = serve(Router::new().route("/actuator/health", get(|| async { "ok" }))).await;
        let failing = serve(Router::new().route(
            "/actuator/health",
            get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        ))
        .await;

        let aggregator = HealthAggregator::new(
            vec![service("user-service", healthy), service("live-lecture-service", failing)],
            &config(1_000),
        );

        let snapshot = aggregator.aggregate().await;
        assert!(!snapshot.is_up());
        assert!(snapshot.services["user-service"].is_up());
        let down = &snapshot.services["live-lecture-service"];
        assert_eq!(down.status, HealthStatus::Down);
        assert_eq!(down.detail.as_deref(), Some("status 503"));
    }

    #[tokio::test]
    async fn test_slow_service_times_out() {
        let slow = serve(Router::new().route(
            "/actuator/health",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                "late"
            }),
        ))
        .await;

        let aggregator = HealthAggregator::new(vec![service("recorded-lecture-service", slow)], &config(100));
        let started = std::time::Instant::now();
        let snapshot = aggregator.aggregate().await;

        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(
            snapshot.services["recorded-lecture-service"].detail.as_deref(),
            Some("timeout after 100ms")
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_is_down() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let aggregator = HealthAggregator::new(vec![service("user-service", addr)], &config(500));
        let snapshot = aggregator.aggregate().await;
        assert!(!snapshot.is_up());
        assert!(snapshot.services["user-service"].detail.is_some());
    }

    #[tokio::test]
    async fn test_no_services_is_up() {
        let aggregator = HealthAggregator::new(Vec::new(), &config(500));
        assert!(aggregator.aggregate().await.is_up());
    }
}
