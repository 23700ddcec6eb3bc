//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Remote lookup:
//!     → guard.rs (ask the breaker for a permit)
//!         ├─ rejected → fallback(input, None)
//!         └─ admitted → timeouts.rs (enforce per-call deadline)
//!                         → success: record on breaker, return value
//!                         → failure: record on breaker, fallback(input, Some(err))
//!     → circuit_breaker.rs (track outcomes, open/half-open/close)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every remote call has a deadline
//! - No retries: at most one remote attempt per lookup
//! - Circuit breaker prevents cascading failures
//! - Fallbacks are plain function values supplied at registration

pub mod circuit_breaker;
pub mod guard;
pub mod timeouts;

pub use circuit_breaker::{BreakerRegistry, BreakerState, BreakerStatus, CircuitBreaker};
pub use guard::{Fallback, Guarded};
pub use timeouts::{with_deadline, DeadlineExceeded};
