//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Billing service (billing.rs):
//!     TCP connection
//!     → request.rs (request ID, trace span)
//!     → GET /API/bills/{id} → aggregation::BillingService
//!     → error.rs (domain error → status + JSON body)
//!
//! Edge router (edge.rs):
//!     TCP connection
//!     → request.rs (request ID, trace span)
//!     → routing::Router (path prefix → logical service)
//!     → discovery::ServiceRegistry (service → instance)
//!     → hyper client forward → stream response back
//! ```

pub mod billing;
pub mod edge;
pub mod error;
pub mod request;

pub use billing::BillingServer;
pub use edge::{EdgeServer, EdgeTables};
pub use error::ApiError;
pub use request::{MakeRequestUuid, X_REQUEST_ID};
