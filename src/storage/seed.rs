//! Deterministic demo data for the billing store.

use chrono::{DateTime, Utc};

use crate::domain::{BillId, CustomerId, NewBill, NewLineItem, ProductId};
use crate::storage::{BillStore, StorageError};

/// Customers that get one demo bill each.
pub const DEMO_CUSTOMERS: [CustomerId; 3] = [1, 2, 3];

/// Products listed on every demo bill, with the unit price captured on the item.
pub const DEMO_PRODUCTS: [(ProductId, f64); 3] = [(1, 1200.0), (2, 1500.0), (3, 1400.0)];

/// Quantity of `product_id` on the demo bill of `customer_id`.
pub fn demo_quantity(customer_id: CustomerId, product_id: ProductId) -> u32 {
    (customer_id * product_id) as u32
}

/// Insert one bill per demo customer, each listing every demo product.
pub async fn seed_demo_bills(
    store: &dyn BillStore,
    billing_date: DateTime<Utc>,
) -> Result<Vec<BillId>, StorageError> {
    let mut ids = Vec::with_capacity(DEMO_CUSTOMERS.len());
    for customer_id in DEMO_CUSTOMERS {
        let bill = store
            .save_bill(NewBill {
                billing_date,
                customer_id,
            })
            .await?;
        for (product_id, price) in DEMO_PRODUCTS {
            store
                .save_line_item(NewLineItem {
                    bill_id: bill.id,
                    product_id,
                    quantity: demo_quantity(customer_id, product_id),
                    price,
                })
                .await?;
        }
        ids.push(bill.id);
    }
    tracing::info!(bills = ids.len(), "Seeded demo bills");
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryBillStore;

    #[tokio::test]
    async fn test_seed_is_deterministic() {
        let store = InMemoryBillStore::new(None);
        let ids = seed_demo_bills(&store, Utc::now()).await.unwrap();
        assert_eq!(ids, vec![1, 5, 9]);

        let record = store.find_bill_by_id(5).await.unwrap().unwrap();
        assert_eq!(record.bill.customer_id, 2);
        let summary: Vec<_> = record
            .items
            .iter()
            .map(|i| (i.product_id, i.quantity, i.price))
            .collect();
        assert_eq!(summary, vec![(1, 2, 1200.0), (2, 4, 1500.0), (3, 6, 1400.0)]);
    }
}
