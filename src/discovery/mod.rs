//! Service discovery subsystem.
//!
//! # Data Flow
//! ```text
//! Logical service name ("customer-service")
//!     → registry.rs (instances of that service)
//!     → Apply load balancing algorithm:
//!         - round_robin.rs (rotate through instances)
//!         - least_conn.rs (pick instance with fewest in-flight requests)
//!     → instance.rs (acquire in-flight guard)
//!     → Return instance guard or None
//! ```
//!
//! # Design Decisions
//! - Callers only see [`ServiceResolver`]; the static registry is one implementation
//! - Algorithm selected once from configuration
//! - Unhealthy instances excluded from selection

use std::sync::Arc;

pub mod instance;
pub mod least_conn;
pub mod registry;
pub mod round_robin;

pub use instance::{HealthState, Instance, InstanceGuard};
pub use registry::ServiceRegistry;

/// Instance selection strategy.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Pick the next instance, or `None` when no instance is eligible.
    fn next_instance(&self, instances: &[Arc<Instance>]) -> Option<Arc<Instance>>;
}

/// Name-to-address resolution.
pub trait ServiceResolver: Send + Sync {
    /// Pick a live instance of the logical `service`.
    fn resolve(&self, service: &str) -> Option<InstanceGuard>;
}
