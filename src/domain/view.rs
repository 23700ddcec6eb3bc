//! Response views combining stored records with fetched snapshots.

use serde::Serialize;

use crate::domain::bill::{Bill, LineItem};
use crate::domain::snapshot::{Customer, Product};

/// A line item enriched with its product snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemView {
    #[serde(flatten)]
    pub item: LineItem,
    pub product: Product,
}

/// A bill enriched with its customer and product snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillView {
    #[serde(flatten)]
    pub bill: Bill,
    pub product_items: Vec<LineItemView>,
    pub customer: Customer,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_view_json_shape() {
        let view = BillView {
            bill: Bill {
                id: 1,
                billing_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                customer_id: 7,
            },
            product_items: vec![LineItemView {
                item: LineItem {
                    id: 4,
                    bill_id: 1,
                    product_id: 2,
                    quantity: 3,
                    price: 1500.0,
                },
                product: Product::unknown(2),
            }],
            customer: Customer::unknown(7),
        };

        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 1,
                "billingDate": "2024-01-01T00:00:00Z",
                "customerId": 7,
                "productItems": [{
                    "id": 4,
                    "productId": 2,
                    "quantity": 3,
                    "price": 1500.0,
                    "product": {"id": 2, "name": "unknown", "price": 0.0, "quantity": 0}
                }],
                "customer": {"id": 7, "name": "unknown", "email": "unknown"}
            })
        );
    }
}
