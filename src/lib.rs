//! Billing mesh library.
//!
//! A billing service that enriches stored bills with customer and product
//! snapshots fetched through circuit breakers, plus the path-prefix edge router
//! and fixture upstreams that complete the mesh.

// Core domain
pub mod aggregation;
pub mod domain;
pub mod storage;

// Remote calls
pub mod clients;
pub mod discovery;
pub mod resilience;

// Serving
pub mod http;
pub mod routing;
pub mod upstream;

// Cross-cutting concerns
pub mod config;
pub mod health;
pub mod lifecycle;
pub mod observability;

pub use aggregation::{BillingError, BillingService};
pub use config::AppConfig;
pub use http::{BillingServer, EdgeServer};
pub use lifecycle::Shutdown;
