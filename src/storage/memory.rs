//! In-memory bill store with optional JSON snapshot persistence.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::domain::{Bill, BillId, BillRecord, LineItem, NewBill, NewLineItem};
use crate::storage::{BillStore, StorageError};

#[derive(Debug)]
struct Tables {
    bills: DashMap<BillId, Bill>,
    items: DashMap<BillId, Vec<LineItem>>,
    /// Bills and items share one id sequence.
    next_id: AtomicU64,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            bills: DashMap::new(),
            items: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }
}

/// On-disk layout: items nested under their bill.
#[derive(Serialize, Deserialize)]
struct Snapshot {
    next_id: u64,
    bills: Vec<SnapshotBill>,
}

#[derive(Serialize, Deserialize)]
struct SnapshotBill {
    #[serde(flatten)]
    bill: Bill,
    items: Vec<LineItem>,
}

/// A thread-safe bill store backed by concurrent maps.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBillStore {
    tables: Arc<Tables>,
    persistence_path: Option<PathBuf>,
}

impl InMemoryBillStore {
    /// Create a new empty store.
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            tables: Arc::new(Tables::default()),
            persistence_path,
        }
    }

    /// Load from file if it exists, otherwise start empty.
    pub fn load_from_file(path: &Path) -> Result<Self, StorageError> {
        let store = Self::new(Some(path.to_path_buf()));
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let snapshot: Snapshot = serde_json::from_reader(reader)?;

            let mut max_id = 0;
            for entry in snapshot.bills {
                let bill_id = entry.bill.id;
                max_id = max_id.max(bill_id);
                let items: Vec<LineItem> = entry
                    .items
                    .into_iter()
                    .map(|mut item| {
                        item.bill_id = bill_id;
                        max_id = max_id.max(item.id);
                        item
                    })
                    .collect();
                store.tables.items.insert(bill_id, items);
                store.tables.bills.insert(bill_id, entry.bill);
            }
            store
                .tables
                .next_id
                .store(snapshot.next_id.max(max_id + 1), Ordering::SeqCst);
            tracing::info!(path = ?path, bills = store.len(), "Loaded bills from snapshot");
        }
        Ok(store)
    }

    /// Save to the configured snapshot file, if any.
    pub fn save_to_file(&self) -> Result<(), StorageError> {
        let Some(path) = &self.persistence_path else {
            return Ok(());
        };

        let mut bills: Vec<SnapshotBill> = self
            .tables
            .bills
            .iter()
            .map(|entry| SnapshotBill {
                bill: entry.value().clone(),
                items: self
                    .tables
                    .items
                    .get(entry.key())
                    .map(|items| items.clone())
                    .unwrap_or_default(),
            })
            .collect();
        bills.sort_by_key(|b| b.bill.id);

        let snapshot = Snapshot {
            next_id: self.tables.next_id.load(Ordering::SeqCst),
            bills,
        };
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, &snapshot)?;
        tracing::info!(path = ?path, bills = snapshot.bills.len(), "Saved bills to snapshot");
        Ok(())
    }

    /// Number of stored bills.
    pub fn len(&self) -> usize {
        self.tables.bills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.bills.is_empty()
    }

    fn next_id(&self) -> u64 {
        self.tables.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait]
impl BillStore for InMemoryBillStore {
    async fn find_bill_by_id(&self, id: BillId) -> Result<Option<BillRecord>, StorageError> {
        let Some(bill) = self.tables.bills.get(&id).map(|b| b.value().clone()) else {
            return Ok(None);
        };
        let items = self
            .tables
            .items
            .get(&id)
            .map(|items| items.clone())
            .unwrap_or_default();
        Ok(Some(BillRecord { bill, items }))
    }

    async fn save_bill(&self, bill: NewBill) -> Result<Bill, StorageError> {
        let bill = Bill {
            id: self.next_id(),
            billing_date: bill.billing_date,
            customer_id: bill.customer_id,
        };
        self.tables.items.insert(bill.id, Vec::new());
        self.tables.bills.insert(bill.id, bill.clone());
        Ok(bill)
    }

    async fn save_line_item(&self, item: NewLineItem) -> Result<LineItem, StorageError> {
        if item.quantity == 0 {
            return Err(StorageError::InvalidItem("quantity must be positive"));
        }
        if !(item.price.is_finite() && item.price >= 0.0) {
            return Err(StorageError::InvalidItem("price must be a non-negative number"));
        }

        let mut items = self
            .tables
            .items
            .get_mut(&item.bill_id)
            .ok_or(StorageError::MissingBill(item.bill_id))?;
        let item = LineItem {
            id: self.next_id(),
            bill_id: item.bill_id,
            product_id: item.product_id,
            quantity: item.quantity,
            price: item.price,
        };
        items.push(item.clone());
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn new_bill(customer_id: u64) -> NewBill {
        NewBill {
            billing_date: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            customer_id,
        }
    }

    fn new_item(bill_id: u64, product_id: u64) -> NewLineItem {
        NewLineItem {
            bill_id,
            product_id,
            quantity: 2,
            price: 99.5,
        }
    }

    #[tokio::test]
    async fn test_save_and_find() {
        let store = InMemoryBillStore::new(None);
        let bill = store.save_bill(new_bill(3)).await.unwrap();
        store.save_line_item(new_item(bill.id, 1)).await.unwrap();
        store.save_line_item(new_item(bill.id, 2)).await.unwrap();

        let record = store.find_bill_by_id(bill.id).await.unwrap().unwrap();
        assert_eq!(record.bill.customer_id, 3);
        assert_eq!(record.items.len(), 2);
        assert!(record.items.iter().all(|i| i.bill_id == bill.id));
        assert_eq!(
            record.items.iter().map(|i| i.product_id).collect::<Vec<_>>(),
            vec![1, 2]
        );

        assert!(store.find_bill_by_id(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ids_share_one_sequence() {
        let store = InMemoryBillStore::new(None);
        let bill = store.save_bill(new_bill(1)).await.unwrap();
        let item = store.save_line_item(new_item(bill.id, 1)).await.unwrap();
        let second = store.save_bill(new_bill(2)).await.unwrap();
        assert_eq!((bill.id, item.id, second.id), (1, 2, 3));
    }

    #[tokio::test]
    async fn test_item_requires_live_bill() {
        let store = InMemoryBillStore::new(None);
        let err = store.save_line_item(new_item(42, 1)).await.unwrap_err();
        assert!(matches!(err, StorageError::MissingBill(42)));
    }

    #[tokio::test]
    async fn test_item_invariants() {
        let store = InMemoryBillStore::new(None);
        let bill = store.save_bill(new_bill(1)).await.unwrap();

        let mut zero = new_item(bill.id, 1);
        zero.quantity = 0;
        assert!(matches!(
            store.save_line_item(zero).await,
            Err(StorageError::InvalidItem(_))
        ));

        let mut negative = new_item(bill.id, 1);
        negative.price = -1.0;
        assert!(matches!(
            store.save_line_item(negative).await,
            Err(StorageError::InvalidItem(_))
        ));
    }

    #[tokio::test]
    async fn test_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bills.json");

        let store = InMemoryBillStore::new(Some(path.clone()));
        let bill = store.save_bill(new_bill(2)).await.unwrap();
        store.save_line_item(new_item(bill.id, 5)).await.unwrap();
        store.save_to_file().unwrap();

        let loaded = InMemoryBillStore::load_from_file(&path).unwrap();
        let record = loaded.find_bill_by_id(bill.id).await.unwrap().unwrap();
        assert_eq!(record.bill, bill);
        assert_eq!(record.items[0].bill_id, bill.id);
        assert_eq!(record.items[0].product_id, 5);

        // the sequence continues after the loaded ids
        let next = loaded.save_bill(new_bill(1)).await.unwrap();
        assert_eq!(next.id, 3);
    }

    #[test]
    fn test_missing_snapshot_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = InMemoryBillStore::load_from_file(&dir.path().join("absent.json")).unwrap();
        assert!(store.is_empty());
    }
}
