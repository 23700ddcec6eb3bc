//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::discovery::{instance::Instance, LoadBalancer};

/// Round-robin selector.
/// Stores an internal counter to rotate through instances.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancer for RoundRobin {
    fn next_instance(&self, instances: &[Arc<Instance>]) -> Option<Arc<Instance>> {
        if instances.is_empty() {
            return None;
        }

        // Skip unhealthy instances, at most one full lap.
        let start_count = self.counter.fetch_add(1, Ordering::Relaxed);
        let len = instances.len();

        for i in 0..len {
            let instance = &instances[(start_count + i) % len];
            if instance.is_healthy() {
                return Some(instance.clone());
            }
        }
        None
    }
}
