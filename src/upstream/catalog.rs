//! Deterministic customer and product catalogs.

use std::collections::BTreeMap;

use crate::domain::{Customer, CustomerId, Product, ProductId};

/// In-memory, read-only collection keyed by id.
#[derive(Debug, Clone)]
pub struct Catalog<T> {
    entries: BTreeMap<u64, T>,
}

impl<T: Clone> Catalog<T> {
    pub fn new(entries: impl IntoIterator<Item = (u64, T)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, id: u64) -> Option<T> {
        self.entries.get(&id).cloned()
    }

    /// Every entry, ordered by id.
    pub fn all(&self) -> Vec<T> {
        self.entries.values().cloned().collect()
    }
}

pub fn demo_customers() -> Catalog<Customer> {
    Catalog::new(
        [(1, "Ayoub"), (2, "Salwa"), (3, "Amin")]
            .into_iter()
            .map(|(id, name): (CustomerId, &str)| {
                let customer = Customer {
                    id,
                    name: name.to_string(),
                    email: format!("{name}@gmail.com"),
                };
                (id, customer)
            }),
    )
}

pub fn demo_products() -> Catalog<Product> {
    Catalog::new(
        [
            (1, "Smart Phone", 1200.0, 10),
            (2, "Laptop", 1500.0, 3),
            (3, "Washing Machine", 1400.0, 5),
            (4, "Screen", 1000.0, 6),
            (5, "Mouse", 150.0, 20),
        ]
        .into_iter()
        .map(|(id, name, price, quantity): (ProductId, &str, f64, u32)| {
            let product = Product {
                id,
                name: name.to_string(),
                price,
                quantity,
            };
            (id, product)
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_catalogs() {
        let customers = demo_customers();
        assert_eq!(customers.all().len(), 3);
        assert_eq!(customers.get(2).unwrap().email, "Salwa@gmail.com");
        assert!(customers.get(4).is_none());

        let products = demo_products();
        let names: Vec<String> = products.all().into_iter().map(|p| p.name).collect();
        assert_eq!(names, ["Smart Phone", "Laptop", "Washing Machine", "Screen", "Mouse"]);
        assert_eq!(products.get(5).unwrap().price, 150.0);
    }
}
