//! Local bill storage.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     snapshot file (optional) → memory.rs (load)
//!     empty store + seed_demo_data → seed.rs (insert demo bills)
//!
//! Request:
//!     aggregation → BillStore::find_bill_by_id → BillRecord (bill + owned items)
//!
//! Shutdown:
//!     memory.rs (save snapshot)
//! ```
//!
//! # Design Decisions
//! - The store is a collaborator behind a trait; the core only needs read-by-id and insert
//! - Items are only reachable through their bill
//! - Inserting an item for a missing bill is rejected

use async_trait::async_trait;

use crate::domain::{Bill, BillId, BillRecord, LineItem, NewBill, NewLineItem};

pub mod memory;
pub mod seed;

pub use memory::InMemoryBillStore;

/// Errors raised by a bill store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("bill {0} does not exist")]
    MissingBill(BillId),

    #[error("invalid line item: {0}")]
    InvalidItem(&'static str),

    #[error("snapshot IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot format error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persistence contract used by the billing service.
#[async_trait]
pub trait BillStore: Send + Sync {
    /// Load a bill and every item it owns.
    async fn find_bill_by_id(&self, id: BillId) -> Result<Option<BillRecord>, StorageError>;

    /// Insert a bill, assigning its id.
    async fn save_bill(&self, bill: NewBill) -> Result<Bill, StorageError>;

    /// Insert an item under an existing bill, assigning its id.
    async fn save_line_item(&self, item: NewLineItem) -> Result<LineItem, StorageError>;
}
