//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe instances
//! - Update instance health state based on results

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::sync::broadcast;
use tokio::time;

use crate::config::HealthCheckConfig;
use crate::discovery::{Instance, ServiceRegistry};
use crate::observability::metrics;

/// Something that can list the instances currently known.
///
/// The edge router swaps its registry on reload, so the monitor asks for the
/// current set on every round instead of holding a fixed list.
pub trait InstanceSource: Send + Sync {
    fn instances(&self) -> Vec<Arc<Instance>>;
}

impl InstanceSource for ServiceRegistry {
    fn instances(&self) -> Vec<Arc<Instance>> {
        self.all_instances()
    }
}

pub struct HealthMonitor {
    source: Arc<dyn InstanceSource>,
    config: HealthCheckConfig,
    client: Client<HttpConnector, Body>,
}

impl HealthMonitor {
    pub fn new(source: Arc<dyn InstanceSource>, config: HealthCheckConfig) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            source,
            config,
            client,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Active health checks disabled");
            return;
        }

        tracing::info!(
            interval = self.config.interval_secs,
            path = %self.config.path,
            "Health monitor starting"
        );

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs.max(1)));

        loop {
            tokio::select! {
                _ = ticker.tick() => self.check_all().await,
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal");
                    break;
                }
            }
        }
    }

    async fn check_all(&self) {
        for instance in self.source.instances() {
            let healthy = self.probe(&instance).await;

            if healthy {
                instance.mark_success();
            } else {
                instance.mark_failure();
            }

            metrics::record_instance_health(&instance.name, instance.is_healthy());
        }
    }

    async fn probe(&self, instance: &Instance) -> bool {
        let uri = format!("http://{}{}", instance.addr, self.config.path);
        let request = match Request::builder()
            .method("GET")
            .uri(uri)
            .header("user-agent", "billing-mesh-health-check")
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(error = %e, "Failed to build health check request");
                return false;
            }
        };

        let timeout = Duration::from_secs(self.config.timeout_secs);
        match time::timeout(timeout, self.client.request(request)).await {
            Ok(Ok(response)) => {
                let success = response.status().is_success();
                if !success {
                    tracing::warn!(instance = %instance.name, status = %response.status(), "Health check failed: non-success status");
                }
                success
            }
            Ok(Err(e)) => {
                tracing::warn!(instance = %instance.name, error = %e, "Health check failed: connection error");
                false
            }
            Err(_) => {
                tracing::warn!(instance = %instance.name, "Health check failed: timeout");
                false
            }
        }
    }
}
