//! Locally owned bill records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::snapshot::{CustomerId, ProductId};

pub type BillId = u64;
pub type LineItemId = u64;

/// A persisted bill header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub id: BillId,
    pub billing_date: DateTime<Utc>,
    /// Reference into the customer service; fixed at creation.
    pub customer_id: CustomerId,
}

/// A persisted line item. The price is captured when the item is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: LineItemId,
    /// Owning bill. Stored, but never part of a response.
    #[serde(skip_serializing, default)]
    pub bill_id: BillId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: f64,
}

/// A bill together with the items it owns, as loaded from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct BillRecord {
    pub bill: Bill,
    pub items: Vec<LineItem>,
}

/// Insert request for a bill; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewBill {
    pub billing_date: DateTime<Utc>,
    pub customer_id: CustomerId,
}

/// Insert request for a line item of an existing bill.
#[derive(Debug, Clone)]
pub struct NewLineItem {
    pub bill_id: BillId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: f64,
}
