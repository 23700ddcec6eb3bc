//! Billing domain types.
//!
//! # Data Flow
//! ```text
//! Storage                 Upstreams (over HTTP)
//!     bill.rs                 snapshot.rs
//!     Bill + LineItem[]       Customer, Product
//!          │                      │
//!          └──────────┬───────────┘
//!                     ▼
//!                 view.rs
//!     BillView { Bill, customer, LineItemView[] }
//!                     │
//!                     ▼
//!              JSON response
//! ```
//!
//! # Design Decisions
//! - Persisted records never carry enrichment; views are built per read
//! - Snapshots are values, fetched fresh per aggregation and never stored
//! - Field names serialize in camelCase to match the upstream services

pub mod bill;
pub mod snapshot;
pub mod view;

pub use bill::{Bill, BillId, BillRecord, LineItem, LineItemId, NewBill, NewLineItem};
pub use snapshot::{Customer, CustomerId, Product, ProductId};
pub use view::{BillView, LineItemView};
