//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → Probe every instance of every service
//!     → Instance::mark_success / mark_failure
//!
//! Passive health checks (edge router, when enabled):
//!     Forwarding failure observed
//!     → Instance::mark_failure
//!
//! State machine (discovery::instance):
//!     Unknown → Healthy ←→ Unhealthy
//!     With thresholds to prevent flapping
//! ```
//!
//! # Design Decisions
//! - Active and passive checks are complementary
//! - State transitions require consecutive successes/failures
//! - Health state is per-instance, not per-service

pub mod active;

pub use active::{HealthMonitor, InstanceSource};
