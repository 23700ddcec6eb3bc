//! Static service registry.
//!
//! # Responsibilities
//! - Group configured instances by logical service name
//! - Apply the load balancing strategy to select an instance
//! - Provide guards for in-flight tracking

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::{HealthCheckConfig, InstanceConfig, Strategy};
use crate::discovery::{
    instance::{HealthThresholds, Instance, InstanceGuard},
    least_conn::LeastConnections,
    round_robin::RoundRobin,
    LoadBalancer, ServiceResolver,
};

#[derive(Debug)]
struct ServicePool {
    instances: Vec<Arc<Instance>>,
    balancer: Box<dyn LoadBalancer>,
}

/// Resolves logical service names to live instances.
#[derive(Debug)]
pub struct ServiceRegistry {
    services: HashMap<String, ServicePool>,
    passive_health: bool,
}

impl ServiceRegistry {
    /// Build the registry from configuration.
    pub fn new(configs: &[InstanceConfig], strategy: Strategy, health: &HealthCheckConfig) -> Self {
        let thresholds = HealthThresholds {
            healthy: health.healthy_threshold as usize,
            unhealthy: health.unhealthy_threshold as usize,
        };

        let mut grouped: HashMap<String, Vec<Arc<Instance>>> = HashMap::new();
        for config in configs {
            match config.address.parse::<SocketAddr>() {
                Ok(addr) => {
                    let instance = Instance::new(
                        &config.name,
                        &config.service,
                        addr,
                        config.max_connections,
                        thresholds,
                    );
                    grouped
                        .entry(config.service.clone())
                        .or_default()
                        .push(Arc::new(instance));
                }
                Err(_) => {
                    tracing::warn!(instance = %config.name, address = %config.address, "Invalid instance address");
                }
            }
        }

        let services = grouped
            .into_iter()
            .map(|(name, instances)| {
                let balancer: Box<dyn LoadBalancer> = match strategy {
                    Strategy::RoundRobin => Box::new(RoundRobin::new()),
                    Strategy::LeastConnections => Box::new(LeastConnections::new()),
                };
                (name, ServicePool { instances, balancer })
            })
            .collect();

        Self {
            services,
            passive_health: health.enabled,
        }
    }

    /// Select an instance of `service`.
    /// Returns a guard that decrements the in-flight count on drop.
    pub fn get(&self, service: &str) -> Option<InstanceGuard> {
        let Some(pool) = self.services.get(service) else {
            tracing::debug!(service = %service, "Service not found in registry");
            return None;
        };

        match pool.balancer.next_instance(&pool.instances) {
            Some(instance) => {
                let guard = instance.try_create_guard();
                if guard.is_none() {
                    tracing::debug!(instance = %instance.name, limit = instance.max_connections, "Instance at connection limit");
                }
                guard
            }
            None => {
                tracing::debug!(service = %service, instance_count = pool.instances.len(), "No healthy instances found");
                None
            }
        }
    }

    /// Return every instance (for health checking).
    pub fn all_instances(&self) -> Vec<Arc<Instance>> {
        self.services
            .values()
            .flat_map(|pool| pool.instances.iter())
            .cloned()
            .collect()
    }

    /// Whether request outcomes should feed instance health.
    pub fn passive_health(&self) -> bool {
        self.passive_health
    }
}

impl ServiceResolver for ServiceRegistry {
    fn resolve(&self, service: &str) -> Option<InstanceGuard> {
        self.get(service)
    }
}
