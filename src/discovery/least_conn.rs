//! Least Connections load balancing strategy.

use std::sync::Arc;

use crate::discovery::{instance::Instance, LoadBalancer};

/// Least connections selector.
/// Selects the healthy instance with the minimum number of in-flight requests.
#[derive(Debug, Default)]
pub struct LeastConnections;

impl LeastConnections {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for LeastConnections {
    fn next_instance(&self, instances: &[Arc<Instance>]) -> Option<Arc<Instance>> {
        // In case of tie, the first one is selected (stability)
        instances
            .iter()
            .filter(|i| i.is_healthy())
            .min_by_key(|i| i.active_connections())
            .cloned()
    }
}
