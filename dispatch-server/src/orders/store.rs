//! redb-based order store
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | JSON-serialized `Order` | Authoritative order records |
//!
//! # Conditional updates
//!
//! Every mutation of an existing order goes through
//! [`OrderStore::update_conditional`]: a single write transaction that
//! re-reads the record, checks the expected prior state, applies the
//! mutation and commits. redb serializes write transactions, so the check
//! and the write are indivisible at the record level; a concurrent writer
//! that commits first makes the precondition fail and the whole update is
//! aborted. A failed precondition is final - callers must not retry it.
//!
//! # Durability
//!
//! redb commits with `Durability::Immediate`: once `commit()` returns the
//! record is persistent and the database file is in a consistent state.
//! Lifecycle events are emitted only after this point.

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
};
use shared::models::{Order, OrderStatus};
use shared::util;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Table for storing orders: key = order_id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Order already exists: {0}")]
    AlreadyExists(String),

    /// The conditional update found a different persisted state than the
    /// caller expected. Final outcome, not a transient error.
    #[error(
        "Precondition failed for order {order_id}: expected status {expected}, found {actual} (version {actual_version})"
    )]
    PreconditionFailed {
        order_id: String,
        expected: OrderStatus,
        actual: OrderStatus,
        actual_version: u64,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for shared::AppError {
    fn from(err: StoreError) -> Self {
        use shared::{AppError, ErrorCode};
        match err {
            StoreError::OrderNotFound(id) => AppError::order_not_found(id),
            StoreError::AlreadyExists(id) => {
                AppError::new(ErrorCode::AlreadyExists).with_detail("order_id", id)
            }
            StoreError::PreconditionFailed { order_id, .. } => AppError::claim_conflict(order_id),
            other => AppError::database(other.to_string()),
        }
    }
}

/// Order store backed by redb
#[derive(Clone)]
pub struct OrderStore {
    db: Arc<Database>,
}

impl OrderStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = Database::create(path)?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    /// Open an in-memory database (tests and in-process demos)
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    fn init_tables(&self) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Cheap liveness probe against the underlying database
    pub fn ping(&self) -> StoreResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(ORDERS_TABLE)?;
        Ok(())
    }

    // ========== Write Operations ==========

    /// Persist a newly created order
    pub fn insert(&self, order: &Order) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            if table.get(order.id.as_str())?.is_some() {
                return Err(StoreError::AlreadyExists(order.id.clone()));
            }
            let value = serde_json::to_vec(order)?;
            table.insert(order.id.as_str(), value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Atomically mutate an order, conditioned on its current status (and
    /// optionally its version)
    ///
    /// The mutation runs inside a single write transaction:
    /// 1. re-read the persisted record
    /// 2. verify `status == expected_status` (and `version` if given)
    /// 3. apply `mutate`, bump `version`, refresh `updated_at`
    /// 4. commit and return the post-image
    ///
    /// On a precondition mismatch the transaction is dropped without
    /// committing and [`StoreError::PreconditionFailed`] is returned
    /// immediately - the caller never blocks on another writer's outcome
    /// beyond the serialized transaction itself.
    pub fn update_conditional(
        &self,
        order_id: &str,
        expected_status: OrderStatus,
        expected_version: Option<u64>,
        mutate: impl FnOnce(&mut Order),
    ) -> StoreResult<Order> {
        let txn = self.db.begin_write()?;
        let updated = {
            let mut table = txn.open_table(ORDERS_TABLE)?;

            let mut order: Order = match table.get(order_id)? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Err(StoreError::OrderNotFound(order_id.to_string())),
            };

            let version_ok = expected_version.is_none_or(|v| order.version == v);
            if order.status != expected_status || !version_ok {
                return Err(StoreError::PreconditionFailed {
                    order_id: order_id.to_string(),
                    expected: expected_status,
                    actual: order.status,
                    actual_version: order.version,
                });
            }

            mutate(&mut order);
            order.version += 1;
            order.updated_at = util::now_millis();

            let value = serde_json::to_vec(&order)?;
            table.insert(order_id, value.as_slice())?;
            order
        };
        txn.commit()?;
        Ok(updated)
    }

    // ========== Read Operations ==========

    /// Get an order by ID
    pub fn get(&self, order_id: &str) -> StoreResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        match table.get(order_id)? {
            Some(value) => {
                let order: Order = serde_json::from_slice(value.value())?;
                Ok(Some(order))
            }
            None => Ok(None),
        }
    }

    /// All orders, newest first
    pub fn list_all(&self) -> StoreResult<Vec<Order>> {
        let mut orders = self.scan(|_| true)?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    /// Orders with the given status, oldest first
    pub fn list_by_status(&self, status: OrderStatus) -> StoreResult<Vec<Order>> {
        let mut orders = self.scan(|o| o.status == status)?;
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }

    /// Orders placed by the given customer, newest first
    pub fn list_by_customer(&self, customer_id: &str) -> StoreResult<Vec<Order>> {
        let mut orders = self.scan(|o| o.customer_id == customer_id)?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    /// Orders assigned to the given delivery partner, newest first
    pub fn list_by_partner(&self, partner_id: &str) -> StoreResult<Vec<Order>> {
        let mut orders = self.scan(|o| o.is_assigned_to(partner_id))?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    /// Number of persisted orders
    pub fn count(&self) -> StoreResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        Ok(table.len()?)
    }

    fn scan(&self, keep: impl Fn(&Order) -> bool) -> StoreResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let order: Order = serde_json::from_slice(value.value())?;
            if keep(&order) {
                orders.push(order);
            }
        }
        Ok(orders)
    }
}
