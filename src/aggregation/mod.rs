//! Bill aggregation subsystem.
//!
//! # Data Flow
//! ```text
//! get_enriched_bill(id)
//!     → storage::BillStore::find_bill_by_id
//!         └─ absent → BillingError::NotFound (404)
//!     → customer lookup (one call, fallback on failure)
//!     → product lookups, one per item, bounded concurrency
//!     → BillView (never persisted)
//! ```
//!
//! # Design Decisions
//! - NotFound is the only domain error surfaced; enrichment failures never are
//! - Items keep storage order; exactly one product snapshot per item
//! - A failing item lookup never affects its siblings

pub mod service;

pub use service::{BillingError, BillingService};
