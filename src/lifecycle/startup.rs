//! Startup orchestration.
//!
//! # Responsibilities
//! - Open (and optionally seed) the bill store
//! - Build discovery, breakers, lookup clients and the aggregation service
//! - Hand back everything the binary needs to serve and shut down
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners are bound by the caller (traffic only when ready)

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;

use crate::aggregation::BillingService;
use crate::clients::{customer_client, http_client, inventory_client, LookupContext};
use crate::config::schema::StorageConfig;
use crate::config::AppConfig;
use crate::discovery::ServiceRegistry;
use crate::http::BillingServer;
use crate::resilience::BreakerRegistry;
use crate::storage::{seed::seed_demo_bills, InMemoryBillStore, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    #[error("http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// A fully wired billing service, ready to be bound to a listener.
pub struct BillingStack {
    pub server: BillingServer,
    pub store: Arc<InMemoryBillStore>,
    pub registry: Arc<ServiceRegistry>,
    pub breakers: Arc<BreakerRegistry>,
}

pub async fn build_billing(config: &AppConfig) -> Result<BillingStack, StartupError> {
    let store = Arc::new(open_store(&config.storage)?);
    if config.storage.seed_demo_data && store.is_empty() {
        seed_demo_bills(store.as_ref(), Utc::now()).await?;
    }

    let registry = Arc::new(ServiceRegistry::new(
        &config.instances,
        config.load_balancing.strategy,
        &config.health_check,
    ));
    let breakers = Arc::new(BreakerRegistry::new(config.breaker.clone()));

    let ctx = LookupContext {
        http: http_client(&config.timeouts)?,
        resolver: registry.clone(),
        breakers: breakers.clone(),
        timeout: config.timeouts.lookup(),
    };
    let customers = customer_client(&ctx, &config.upstreams.customer);
    let products = inventory_client(&ctx, &config.upstreams.inventory);

    let service = Arc::new(BillingService::new(
        store.clone(),
        Arc::new(customers),
        Arc::new(products),
        config.aggregation.max_concurrent_lookups,
    ));
    let server = BillingServer::new(service, breakers.clone(), config.timeouts.billing_request());

    tracing::info!(
        bills = store.len(),
        customer_service = %config.upstreams.customer.service,
        inventory_service = %config.upstreams.inventory.service,
        "Billing service initialized"
    );

    Ok(BillingStack {
        server,
        store,
        registry,
        breakers,
    })
}

fn open_store(storage: &StorageConfig) -> Result<InMemoryBillStore, StorageError> {
    match &storage.snapshot_path {
        Some(path) => InMemoryBillStore::load_from_file(Path::new(path)),
        None => Ok(InMemoryBillStore::new(None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeds_empty_store() {
        let stack = build_billing(&AppConfig::default()).await.unwrap();
        assert_eq!(stack.store.len(), 3);

        let names: Vec<String> = stack.breakers.snapshot().into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["customerService", "inventoryService"]);
    }

    #[tokio::test]
    async fn test_snapshot_is_not_reseeded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bills.json");

        let mut config = AppConfig::default();
        config.storage.snapshot_path = Some(path.to_string_lossy().into_owned());
        let first = build_billing(&config).await.unwrap();
        first.store.save_to_file().unwrap();

        let second = build_billing(&config).await.unwrap();
        assert_eq!(second.store.len(), 3);
    }

    #[tokio::test]
    async fn test_seeding_disabled() {
        let mut config = AppConfig::default();
        config.storage.seed_demo_data = false;
        let stack = build_billing(&config).await.unwrap();
        assert!(stack.store.is_empty());
    }

    #[test]
    fn test_zero_forward_deadline_rejected() {
        let err = crate::config::parse_config("[timeouts]\nforward_secs = 0\n").unwrap_err();
        assert!(matches!(err, crate::config::ConfigError::Validation(_)));
    }

    #[tokio::test]
    async fn test_bill_served_independent_of_forward_deadline() {
        use axum::body::Body;
        use axum::http::{Request, StatusCode};
        use tower::ServiceExt;

        let mut config = AppConfig::default();
        config.timeouts.forward_secs = 1;
        config.timeouts.lookup_ms = 200;
        let stack = build_billing(&config).await.unwrap();

        let response = stack
            .server
            .router()
            .oneshot(Request::get("/API/bills/1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
