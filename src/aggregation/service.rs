//! The enrichment read path.

use std::sync::Arc;

use futures_util::stream::{self, StreamExt};

use crate::clients::SnapshotLookup;
use crate::domain::{BillId, BillView, Customer, LineItemView, Product};
use crate::storage::{BillStore, StorageError};

/// Errors surfaced by the aggregation read path.
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    #[error("bill {0} not found")]
    NotFound(BillId),

    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
}

/// Loads bills and decorates them with customer and product snapshots.
pub struct BillingService {
    store: Arc<dyn BillStore>,
    customers: Arc<dyn SnapshotLookup<Customer>>,
    products: Arc<dyn SnapshotLookup<Product>>,
    max_concurrent_lookups: usize,
}

impl BillingService {
    pub fn new(
        store: Arc<dyn BillStore>,
        customers: Arc<dyn SnapshotLookup<Customer>>,
        products: Arc<dyn SnapshotLookup<Product>>,
        max_concurrent_lookups: usize,
    ) -> Self {
        Self {
            store,
            customers,
            products,
            max_concurrent_lookups: max_concurrent_lookups.max(1),
        }
    }

    /// Load bill `id` and attach its customer and product snapshots.
    pub async fn get_enriched_bill(&self, id: BillId) -> Result<BillView, BillingError> {
        let record = self
            .store
            .find_bill_by_id(id)
            .await?
            .ok_or(BillingError::NotFound(id))?;

        let customer = self.customers.find_by_id(record.bill.customer_id).await;

        let products = &self.products;
        let product_items: Vec<LineItemView> = stream::iter(record.items)
            .map(|item| async move {
                let product = products.find_by_id(item.product_id).await;
                LineItemView { item, product }
            })
            .buffered(self.max_concurrent_lookups)
            .collect()
            .await;

        tracing::debug!(
            bill_id = id,
            customer_id = record.bill.customer_id,
            items = product_items.len(),
            "Bill enriched"
        );

        Ok(BillView {
            bill: record.bill,
            product_items,
            customer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BreakerConfig;
    use crate::domain::{NewBill, NewLineItem};
    use crate::resilience::{BreakerRegistry, Guarded};
    use crate::storage::seed::seed_demo_bills;
    use crate::storage::InMemoryBillStore;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Upstream stand-in behind a real breaker: ids in `down` fail.
    struct Fixture<T> {
        guard: Guarded<u64, T, String>,
        records: HashMap<u64, T>,
        down: HashSet<u64>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl<T: Clone + Send + Sync + 'static> SnapshotLookup<T> for Fixture<T> {
        async fn find_by_id(&self, id: u64) -> T {
            self.guard
                .call(id, |id| async move {
                    self.calls.fetch_add(1, Ordering::SeqCst);
                    if self.down.contains(&id) {
                        return Err(format!("upstream down for {id}"));
                    }
                    self.records
                        .get(&id)
                        .cloned()
                        .ok_or_else(|| format!("404 for {id}"))
                })
                .await
        }
    }

    fn customer(id: u64, name: &str) -> Customer {
        Customer {
            id,
            name: name.into(),
            email: format!("{name}@gmail.com"),
        }
    }

    fn product(id: u64, name: &str, price: f64, quantity: u32) -> Product {
        Product {
            id,
            name: name.into(),
            price,
            quantity,
        }
    }

    fn customers(breakers: &BreakerRegistry, down: &[u64]) -> Arc<Fixture<Customer>> {
        Arc::new(Fixture {
            guard: breakers.register("customerService", |id, _: Option<&String>| {
                Customer::unknown(id)
            }),
            records: [customer(1, "Ayoub"), customer(2, "Salwa"), customer(3, "Amin")]
                .into_iter()
                .map(|c| (c.id, c))
                .collect(),
            down: down.iter().copied().collect(),
            calls: AtomicUsize::new(0),
        })
    }

    fn products(breakers: &BreakerRegistry, down: &[u64]) -> Arc<Fixture<Product>> {
        Arc::new(Fixture {
            guard: breakers.register("inventoryService", |id, _: Option<&String>| {
                Product::unknown(id)
            }),
            records: [
                product(1, "Smart Phone", 1200.0, 10),
                product(2, "Laptop", 1500.0, 3),
                product(3, "Washing Machine", 1400.0, 5),
            ]
            .into_iter()
            .map(|p| (p.id, p))
            .collect(),
            down: down.iter().copied().collect(),
            calls: AtomicUsize::new(0),
        })
    }

    async fn seeded_store() -> Arc<InMemoryBillStore> {
        let store = Arc::new(InMemoryBillStore::new(None));
        seed_demo_bills(store.as_ref(), Utc::now()).await.unwrap();
        store
    }

    fn breakers() -> BreakerRegistry {
        BreakerRegistry::new(BreakerConfig::default())
    }

    #[tokio::test]
    async fn test_enriches_bill_with_fixtures() {
        let breakers = breakers();
        let service = BillingService::new(
            seeded_store().await,
            customers(&breakers, &[]),
            products(&breakers, &[]),
            4,
        );

        let view = service.get_enriched_bill(1).await.unwrap();
        assert_eq!(view.bill.customer_id, 1);
        assert_eq!(view.customer, customer(1, "Ayoub"));
        let enriched: Vec<_> = view
            .product_items
            .iter()
            .map(|i| (i.item.product_id, i.product.name.as_str()))
            .collect();
        assert_eq!(
            enriched,
            vec![(1, "Smart Phone"), (2, "Laptop"), (3, "Washing Machine")]
        );
        // unit price stays the captured snapshot
        assert_eq!(view.product_items[1].item.price, 1500.0);
    }

    #[tokio::test]
    async fn test_unknown_bill() {
        let breakers = breakers();
        let customer_lookup = customers(&breakers, &[]);
        let service = BillingService::new(
            seeded_store().await,
            customer_lookup.clone(),
            products(&breakers, &[]),
            4,
        );

        let err = service.get_enriched_bill(404).await.unwrap_err();
        assert!(matches!(err, BillingError::NotFound(404)));
        assert_eq!(customer_lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_customer_outage_falls_back() {
        let breakers = breakers();
        let service = BillingService::new(
            seeded_store().await,
            customers(&breakers, &[1, 2, 3]),
            products(&breakers, &[]),
            4,
        );

        for id in [1, 5, 9] {
            let view = service.get_enriched_bill(id).await.unwrap();
            assert_eq!(view.customer, Customer::unknown(view.bill.customer_id));
            assert_eq!(view.product_items.len(), 3);
        }
    }

    #[tokio::test]
    async fn test_product_failure_is_isolated() {
        let breakers = breakers();
        let service = BillingService::new(
            seeded_store().await,
            customers(&breakers, &[]),
            products(&breakers, &[2]),
            4,
        );

        let view = service.get_enriched_bill(1).await.unwrap();
        let products: Vec<_> = view.product_items.iter().map(|i| &i.product).collect();
        assert_eq!(products[0], &product(1, "Smart Phone", 1200.0, 10));
        assert_eq!(products[1], &Product::unknown(2));
        assert_eq!(products[2], &product(3, "Washing Machine", 1400.0, 5));
    }

    #[tokio::test]
    async fn test_item_count_and_order_preserved() {
        let store = Arc::new(InMemoryBillStore::new(None));
        let bill = store
            .save_bill(NewBill {
                billing_date: Utc::now(),
                customer_id: 2,
            })
            .await
            .unwrap();
        let mut expected = Vec::new();
        for n in 0..25u64 {
            let item = store
                .save_line_item(NewLineItem {
                    bill_id: bill.id,
                    product_id: n % 4 + 1,
                    quantity: 1,
                    price: 10.0,
                })
                .await
                .unwrap();
            expected.push(item.id);
        }

        let breakers = breakers();
        let product_lookup = products(&breakers, &[]);
        let service =
            BillingService::new(store, customers(&breakers, &[]), product_lookup.clone(), 3);

        let view = service.get_enriched_bill(bill.id).await.unwrap();
        let ids: Vec<_> = view.product_items.iter().map(|i| i.item.id).collect();
        assert_eq!(ids, expected);
        assert_eq!(product_lookup.calls.load(Ordering::SeqCst), 25);
        // product 4 is not in the catalog
        assert!(view
            .product_items
            .iter()
            .filter(|i| i.item.product_id == 4)
            .all(|i| i.product == Product::unknown(4)));
    }

    #[tokio::test]
    async fn test_repeated_reads_are_equal() {
        let breakers = breakers();
        let service = BillingService::new(
            seeded_store().await,
            customers(&breakers, &[]),
            products(&breakers, &[3]),
            2,
        );

        let first = service.get_enriched_bill(5).await.unwrap();
        let second = service.get_enriched_bill(5).await.unwrap();
        assert_eq!(first, second);
    }
}
