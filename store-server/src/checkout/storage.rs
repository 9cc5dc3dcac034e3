//! redb-based storage for the checkout core
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `products` | `product_id` | `ProductRecord` | Price + stock collaborator view |
//! | `carts` | `client_id` | `Cart` | One active cart per client |
//! | `orders` | `order_id` | `Order` | Order ledger |
//! | `orders_by_client` | `(client_id, order_id)` | `()` | Client history index |
//! | `payments` | `payment_id` | `Payment` | Payment records |
//! | `payment_by_order` | `order_id` | `payment_id` | Current payment per order |
//! | `payment_by_session` | `session_id` | `payment_id` | Gateway correlation |
//! | `pending_orders` | `order_id` | `created_at` | Sweep index |
//!
//! # Transactions
//!
//! redb allows exactly one write transaction at a time, so every
//! multi-table mutation (order + items + stock, payment + order status)
//! is serializable by construction. Mutating helpers take a
//! `&WriteTransaction`; services own begin/commit so a failed step
//! drops the whole transaction.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use shared::{Cart, Order, Payment, ProductRecord};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

const PRODUCTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("products");
const CARTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("carts");
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");
const ORDERS_BY_CLIENT_TABLE: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("orders_by_client");
const PAYMENTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("payments");
const PAYMENT_BY_ORDER_TABLE: TableDefinition<&str, &str> =
    TableDefinition::new("payment_by_order");
const PAYMENT_BY_SESSION_TABLE: TableDefinition<&str, &str> =
    TableDefinition::new("payment_by_session");
const PENDING_ORDERS_TABLE: TableDefinition<&str, i64> = TableDefinition::new("pending_orders");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
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

    #[error("Payment not found: {0}")]
    PaymentNotFound(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Checkout storage backed by redb
#[derive(Clone)]
pub struct CheckoutStorage {
    db: Arc<Database>,
}

impl CheckoutStorage {
    /// Open or create the database at the given path.
    ///
    /// redb commits with `Durability::Immediate`: once `commit()`
    /// returns, the order/payment/stock state survives power loss in a
    /// consistent snapshot. Money paths rely on this.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(PRODUCTS_TABLE)?;
            let _ = write_txn.open_table(CARTS_TABLE)?;
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ORDERS_BY_CLIENT_TABLE)?;
            let _ = write_txn.open_table(PAYMENTS_TABLE)?;
            let _ = write_txn.open_table(PAYMENT_BY_ORDER_TABLE)?;
            let _ = write_txn.open_table(PAYMENT_BY_SESSION_TABLE)?;
            let _ = write_txn.open_table(PENDING_ORDERS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction. Blocks while another writer is open,
    /// which is exactly the serialization the checkout core needs.
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    pub fn commit(&self, txn: WriteTransaction) -> StorageResult<()> {
        Ok(txn.commit()?)
    }

    // ========== Products ==========

    pub fn put_product_txn(
        &self,
        txn: &WriteTransaction,
        product: &ProductRecord,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PRODUCTS_TABLE)?;
        let value = serde_json::to_vec(product)?;
        table.insert(product.id.as_str(), value.as_slice())?;
        Ok(())
    }

    pub fn get_product(&self, product_id: &str) -> StorageResult<Option<ProductRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRODUCTS_TABLE)?;
        match table.get(product_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_product_txn(
        &self,
        txn: &WriteTransaction,
        product_id: &str,
    ) -> StorageResult<Option<ProductRecord>> {
        let table = txn.open_table(PRODUCTS_TABLE)?;
        match table.get(product_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    // ========== Carts ==========

    pub fn get_cart(&self, client_id: &str) -> StorageResult<Option<Cart>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CARTS_TABLE)?;
        match table.get(client_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_cart_txn(
        &self,
        txn: &WriteTransaction,
        client_id: &str,
    ) -> StorageResult<Option<Cart>> {
        let table = txn.open_table(CARTS_TABLE)?;
        match table.get(client_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn put_cart_txn(&self, txn: &WriteTransaction, cart: &Cart) -> StorageResult<()> {
        let mut table = txn.open_table(CARTS_TABLE)?;
        let value = serde_json::to_vec(cart)?;
        table.insert(cart.client_id.as_str(), value.as_slice())?;
        Ok(())
    }

    pub fn clear_cart_txn(&self, txn: &WriteTransaction, client_id: &str) -> StorageResult<()> {
        let mut table = txn.open_table(CARTS_TABLE)?;
        table.remove(client_id)?;
        Ok(())
    }

    // ========== Orders ==========

    /// Store an order and maintain the client index.
    pub fn put_order_txn(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            let value = serde_json::to_vec(order)?;
            table.insert(order.id.as_str(), value.as_slice())?;
        }
        let mut index = txn.open_table(ORDERS_BY_CLIENT_TABLE)?;
        index.insert((order.client_id.as_str(), order.id.as_str()), ())?;
        Ok(())
    }

    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// All orders for a client, newest first.
    pub fn list_orders_by_client(&self, client_id: &str) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(ORDERS_BY_CLIENT_TABLE)?;
        let orders_table = read_txn.open_table(ORDERS_TABLE)?;

        let range_start = (client_id, "");
        let range_end = (client_id, "\u{10FFFF}");

        let mut orders = Vec::new();
        for result in index.range(range_start..=range_end)? {
            let (key, _) = result?;
            let order_id = key.value().1;
            if let Some(value) = orders_table.get(order_id)? {
                let order: Order = serde_json::from_slice(value.value())?;
                orders.push(order);
            }
        }

        orders.sort_by_key(|o| std::cmp::Reverse(o.created_at));
        Ok(orders)
    }

    // ========== Pending order index (sweep) ==========

    pub fn mark_pending_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
        created_at: i64,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PENDING_ORDERS_TABLE)?;
        table.insert(order_id, created_at)?;
        Ok(())
    }

    pub fn clear_pending_txn(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<()> {
        let mut table = txn.open_table(PENDING_ORDERS_TABLE)?;
        table.remove(order_id)?;
        Ok(())
    }

    /// Snapshot of `(order_id, created_at)` still awaiting payment.
    pub fn list_pending(&self) -> StorageResult<Vec<(String, i64)>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PENDING_ORDERS_TABLE)?;

        let mut entries = Vec::new();
        for result in table.iter()? {
            let (key, value) = result?;
            entries.push((key.value().to_string(), value.value()));
        }
        Ok(entries)
    }

    // ========== Payments ==========

    /// Store a payment, keeping the per-order pointer and the gateway
    /// session index in step.
    pub fn put_payment_txn(&self, txn: &WriteTransaction, payment: &Payment) -> StorageResult<()> {
        {
            let mut table = txn.open_table(PAYMENTS_TABLE)?;
            let value = serde_json::to_vec(payment)?;
            table.insert(payment.id.as_str(), value.as_slice())?;
        }
        {
            let mut by_order = txn.open_table(PAYMENT_BY_ORDER_TABLE)?;
            by_order.insert(payment.order_id.as_str(), payment.id.as_str())?;
        }
        if let Some(session_id) = &payment.external_reference {
            let mut by_session = txn.open_table(PAYMENT_BY_SESSION_TABLE)?;
            by_session.insert(session_id.as_str(), payment.id.as_str())?;
        }
        Ok(())
    }

    pub fn get_payment(&self, payment_id: &str) -> StorageResult<Option<Payment>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PAYMENTS_TABLE)?;
        match table.get(payment_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Current payment for an order, if any.
    pub fn get_payment_by_order(&self, order_id: &str) -> StorageResult<Option<Payment>> {
        let read_txn = self.db.begin_read()?;
        let by_order = read_txn.open_table(PAYMENT_BY_ORDER_TABLE)?;
        let Some(payment_id) = by_order.get(order_id)?.map(|g| g.value().to_string()) else {
            return Ok(None);
        };
        let table = read_txn.open_table(PAYMENTS_TABLE)?;
        match table.get(payment_id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_payment_by_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<Payment>> {
        let by_order = txn.open_table(PAYMENT_BY_ORDER_TABLE)?;
        let Some(payment_id) = by_order.get(order_id)?.map(|g| g.value().to_string()) else {
            return Ok(None);
        };
        drop(by_order);
        let table = txn.open_table(PAYMENTS_TABLE)?;
        match table.get(payment_id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_payment_by_session_txn(
        &self,
        txn: &WriteTransaction,
        session_id: &str,
    ) -> StorageResult<Option<Payment>> {
        let by_session = txn.open_table(PAYMENT_BY_SESSION_TABLE)?;
        let Some(payment_id) = by_session.get(session_id)?.map(|g| g.value().to_string()) else {
            return Ok(None);
        };
        drop(by_session);
        let table = txn.open_table(PAYMENTS_TABLE)?;
        match table.get(payment_id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }
}
