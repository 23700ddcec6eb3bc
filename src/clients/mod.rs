//! Remote lookup clients for the enrichment upstreams.
//!
//! # Data Flow
//! ```text
//! find_by_id(id)
//!     → resilience::Guarded (breaker permit or fallback)
//!     → discovery::ServiceResolver (logical name → instance)
//!     → GET http://{instance}/{resource}/{id} under a deadline
//!     → decode JSON into the snapshot type
//! ```
//!
//! # Design Decisions
//! - Every failure mode maps to the registered fallback; callers always get a value
//! - One generic client, two registrations (customer.rs, inventory.rs)
//! - The aggregation layer depends on [`SnapshotLookup`], not on HTTP

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::discovery::ServiceResolver;
use crate::resilience::{BreakerRegistry, DeadlineExceeded};

pub mod customer;
pub mod inventory;
pub mod lookup;

pub use customer::{customer_client, CustomerClient};
pub use inventory::{inventory_client, InventoryClient};
pub use lookup::{http_client, RemoteLookup};

/// Why a remote lookup did not produce a snapshot. Never surfaced past the fallback.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("no live instance of '{0}'")]
    NoInstance(String),

    #[error("invalid upstream url: {0}")]
    Url(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("upstream responded with {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed response body: {0}")]
    Decode(#[source] reqwest::Error),

    #[error(transparent)]
    Timeout(#[from] DeadlineExceeded),
}

/// Fetch a snapshot by id. Always yields a value: the real record or a placeholder.
#[async_trait]
pub trait SnapshotLookup<T>: Send + Sync {
    async fn find_by_id(&self, id: u64) -> T;
}

/// Shared plumbing for building lookup clients.
#[derive(Clone)]
pub struct LookupContext {
    pub http: reqwest::Client,
    pub resolver: Arc<dyn ServiceResolver>,
    pub breakers: Arc<BreakerRegistry>,
    pub timeout: Duration,
}
