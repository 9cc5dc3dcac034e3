//! Cart-to-order conversion
//!
//! A single write transaction resolves every cart line against the live
//! catalog, decrements stock, and persists the order. If any line fails
//! the transaction is dropped and nothing was reserved.

use super::error::{CheckoutError, CheckoutResult};
use super::storage::CheckoutStorage;
use shared::{Order, OrderItem, util::now_millis};
use tracing::info;

#[derive(Clone)]
pub struct CheckoutService {
    storage: CheckoutStorage,
}

impl CheckoutService {
    pub fn new(storage: CheckoutStorage) -> Self {
        Self { storage }
    }

    /// Convert the client's cart into a `pending_payment` order,
    /// reserving stock for every line. All-or-nothing: a single
    /// unavailable or under-stocked line fails the whole checkout.
    ///
    /// The cart is NOT cleared here; it survives until a payment
    /// resolves favorably so the client can retry after a decline.
    pub fn create_order(&self, client_id: &str) -> CheckoutResult<Order> {
        let txn = self.storage.begin_write()?;

        let cart = self
            .storage
            .get_cart_txn(&txn, client_id)?
            .filter(|c| !c.is_empty())
            .ok_or(CheckoutError::EmptyCart)?;

        let now = now_millis();
        let mut items = Vec::with_capacity(cart.items.len());
        for line in &cart.items {
            let mut product = self
                .storage
                .get_product_txn(&txn, &line.product_id)?
                .filter(|p| p.available)
                .ok_or_else(|| CheckoutError::ProductUnavailable(line.product_id.clone()))?;

            if line.quantity > product.stock {
                return Err(CheckoutError::InsufficientStock {
                    product_id: product.id,
                    requested: line.quantity,
                    available: product.stock,
                });
            }

            product.stock -= line.quantity;
            self.storage.put_product_txn(&txn, &product)?;

            items.push(OrderItem::new(
                &product.id,
                &product.name,
                line.quantity,
                product.price,
            ));
        }

        let order = Order::from_items(client_id, items, now);
        self.storage.put_order_txn(&txn, &order)?;
        self.storage.mark_pending_txn(&txn, &order.id, now)?;
        self.storage.commit(txn)?;

        info!(
            order_id = %order.id,
            client_id = %client_id,
            total = %order.total_amount,
            lines = order.items.len(),
            "order created"
        );
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::cart::CartService;
    use rust_decimal::Decimal;
    use shared::{OrderStatus, ProductRecord};

    fn seed(storage: &CheckoutStorage, id: &str, price: Decimal, stock: u32) {
        let txn = storage.begin_write().unwrap();
        storage
            .put_product_txn(
                &txn,
                &ProductRecord {
                    id: id.to_string(),
                    name: format!("Product {id}"),
                    price,
                    stock,
                    available: true,
                },
            )
            .unwrap();
        txn.commit().unwrap();
    }

    fn setup() -> (CheckoutStorage, CartService, CheckoutService) {
        let storage = CheckoutStorage::open_in_memory().unwrap();
        seed(&storage, "p-1", Decimal::new(1000, 2), 5);
        seed(&storage, "p-2", Decimal::new(250, 2), 5);
        (
            storage.clone(),
            CartService::new(storage.clone()),
            CheckoutService::new(storage),
        )
    }

    #[test]
    fn test_create_order_snapshots_prices_and_reserves_stock() {
        let (storage, carts, checkout) = setup();
        carts.add_item("c-1", "p-1", 2).unwrap();
        carts.add_item("c-1", "p-2", 4).unwrap();

        let order = checkout.create_order("c-1").unwrap();
        assert_eq!(order.status, OrderStatus::PendingPayment);
        assert_eq!(order.total_amount, Decimal::new(3000, 2));
        assert!(order.total_is_consistent());

        assert_eq!(storage.get_product("p-1").unwrap().unwrap().stock, 3);
        assert_eq!(storage.get_product("p-2").unwrap().unwrap().stock, 1);

        // cart survives until payment resolves
        assert!(!storage.get_cart("c-1").unwrap().unwrap().is_empty());
        // order is tracked for payment-timeout sweeping
        assert_eq!(storage.list_pending().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_cart_rejected() {
        let (_, _, checkout) = setup();
        assert!(matches!(
            checkout.create_order("c-1"),
            Err(CheckoutError::EmptyCart)
        ));
    }

    #[test]
    fn test_partial_shortage_reserves_nothing() {
        let (storage, carts, checkout) = setup();
        carts.add_item("c-1", "p-1", 2).unwrap();
        carts.add_item("c-1", "p-2", 3).unwrap();

        // drain p-2 behind the cart's back
        let txn = storage.begin_write().unwrap();
        let mut p2 = storage.get_product_txn(&txn, "p-2").unwrap().unwrap();
        p2.stock = 1;
        storage.put_product_txn(&txn, &p2).unwrap();
        txn.commit().unwrap();

        let err = checkout.create_order("c-1").unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::InsufficientStock {
                requested: 3,
                available: 1,
                ..
            }
        ));

        // the p-1 decrement from the failed attempt must not persist
        assert_eq!(storage.get_product("p-1").unwrap().unwrap().stock, 5);
        assert!(storage.list_pending().unwrap().is_empty());
    }

    #[test]
    fn test_delisted_product_fails_checkout() {
        let (storage, carts, checkout) = setup();
        carts.add_item("c-1", "p-1", 1).unwrap();

        let txn = storage.begin_write().unwrap();
        let mut p = storage.get_product_txn(&txn, "p-1").unwrap().unwrap();
        p.available = false;
        storage.put_product_txn(&txn, &p).unwrap();
        txn.commit().unwrap();

        assert!(matches!(
            checkout.create_order("c-1"),
            Err(CheckoutError::ProductUnavailable(_))
        ));
    }
}
