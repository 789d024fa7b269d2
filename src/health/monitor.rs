//! Periodic health checking.
//!
//! # Responsibilities
//! - Run the aggregator on an interval
//! - Log services changing between UP and DOWN
//! - Export per-service health gauges

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time;

use crate::config::HealthCheckConfig;
use crate::health::aggregator::{HealthAggregator, HealthSnapshot, HealthStatus};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

pub struct HealthMonitor {
    aggregator: Arc<HealthAggregator>,
    config: HealthCheckConfig,
    last: HashMap<String, HealthStatus>,
}

impl HealthMonitor {
    pub fn new(aggregator: Arc<HealthAggregator>, config: HealthCheckConfig) -> Self {
        Self {
            aggregator,
            config,
            last: HashMap::new(),
        }
    }

    pub async fn run(mut self, shutdown: Shutdown) {
        if !self.config.enabled {
            tracing::info!("Background health checks disabled");
            return;
        }

        tracing::info!(
            interval = self.config.interval_secs,
            path = %self.config.path,
            services = self.aggregator.services().len(),
            "Health monitor starting"
        );

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs.max(1)));

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let snapshot = self.aggregator.aggregate().await;
                    self.observe(&snapshot);
                }
                _ = shutdown.signalled() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    fn observe(&mut self, snapshot: &HealthSnapshot) {
        for (name, health) in &snapshot.services {
            metrics::record_backend_health(name, health.is_up());

            let previous = self.last.insert(name.clone(), health.status);
            match (previous, health.status) {
                (Some(before), now) if before == now => {}
                (_, HealthStatus::Up) => {
                    tracing::info!(service = %name, url = %health.url, "Service is UP");
                }
                (_, HealthStatus::Down) => {
                    tracing::warn!(
                        service = %name,
                        url = %health.url,
                        detail = health.detail.as_deref().unwrap_or(""),
                        "Service is DOWN"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;

    #[tokio::test]
    async fn test_stops_on_shutdown() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = HealthCheckConfig {
            interval_secs: 1,
            timeout_ms: 100,
            ..HealthCheckConfig::default()
        };
        let aggregator = Arc::new(HealthAggregator::new(
            vec![ServiceConfig {
                name: "user-service".into(),
                url: format!("http://{}", addr),
            }],
            &config,
        ));

        let shutdown = Shutdown::new();
        let handle = tokio::spawn(HealthMonitor::new(aggregator, config).run(shutdown.clone()));

        tokio::time::sleep(Duration::from_millis(200)).await;
        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("monitor should stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_disabled_returns_immediately() {
        let config = HealthCheckConfig {
            enabled: false,
            ..HealthCheckConfig::default()
        };
        let aggregator = Arc::new(HealthAggregator::new(Vec::new(), &config));

        tokio::time::timeout(
            Duration::from_millis(500),
            HealthMonitor::new(aggregator, config).run(Shutdown::new()),
        )
        .await
        .expect("disabled monitor returns at once");
    }
}
