//! Snapshots of records owned by other services.

use serde::{Deserialize, Serialize};

pub type CustomerId = u64;
pub type ProductId = u64;

const UNKNOWN: &str = "unknown";

/// Customer as served by `GET /customers/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
}

impl Customer {
    /// Placeholder used when the customer service cannot answer.
    pub fn unknown(id: CustomerId) -> Self {
        Self {
            id,
            name: UNKNOWN.to_string(),
            email: UNKNOWN.to_string(),
        }
    }
}

/// Product as served by `GET /products/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
}

impl Product {
    /// Placeholder used when the inventory service cannot answer.
    pub fn unknown(id: ProductId) -> Self {
        Self {
            id,
            name: UNKNOWN.to_string(),
            price: 0.0,
            quantity: 0,
        }
    }
}
