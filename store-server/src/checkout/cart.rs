//! Server-authoritative cart operations
//!
//! The cart is created lazily on first add and lives until checkout
//! converts it. Quantities are validated against live stock at mutation
//! time; the hard reservation only happens at order creation.

use super::error::{CheckoutError, CheckoutResult};
use super::storage::CheckoutStorage;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{Cart, util::now_millis};

/// Priced cart line for client display
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    /// False when the product was delisted after being added
    pub available: bool,
}

/// Cart with live prices. Totals here are advisory; the binding total
/// is computed once at order creation.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub client_id: String,
    pub items: Vec<CartLineView>,
    pub total: Decimal,
}

#[derive(Clone)]
pub struct CartService {
    storage: CheckoutStorage,
}

impl CartService {
    pub fn new(storage: CheckoutStorage) -> Self {
        Self { storage }
    }

    /// Current cart priced against the live catalog.
    pub fn view(&self, client_id: &str) -> CheckoutResult<CartView> {
        let cart = self
            .storage
            .get_cart(client_id)?
            .unwrap_or_else(|| Cart::new(client_id, now_millis()));

        let mut items = Vec::with_capacity(cart.items.len());
        let mut total = Decimal::ZERO;
        for line in &cart.items {
            let Some(product) = self.storage.get_product(&line.product_id)? else {
                continue;
            };
            let line_total = product.price * Decimal::from(line.quantity);
            if product.available {
                total += line_total;
            }
            items.push(CartLineView {
                product_id: line.product_id.clone(),
                name: product.name,
                quantity: line.quantity,
                unit_price: product.price,
                line_total,
                available: product.available,
            });
        }

        Ok(CartView {
            client_id: client_id.to_string(),
            items,
            total,
        })
    }

    /// Add a product to the cart, merging quantities per product.
    pub fn add_item(&self, client_id: &str, product_id: &str, quantity: u32) -> CheckoutResult<()> {
        if quantity == 0 {
            return Err(CheckoutError::InvalidQuantity(quantity));
        }

        let txn = self.storage.begin_write()?;
        {
            let product = self
                .storage
                .get_product_txn(&txn, product_id)?
                .filter(|p| p.available)
                .ok_or_else(|| CheckoutError::ProductUnavailable(product_id.to_string()))?;

            let now = now_millis();
            let mut cart = self
                .storage
                .get_cart_txn(&txn, client_id)?
                .unwrap_or_else(|| Cart::new(client_id, now));

            let already = cart
                .items
                .iter()
                .find(|i| i.product_id == product_id)
                .map(|i| i.quantity)
                .unwrap_or(0);
            let requested = already
                .checked_add(quantity)
                .ok_or(CheckoutError::InvalidQuantity(quantity))?;
            if requested > product.stock {
                return Err(CheckoutError::InsufficientStock {
                    product_id: product_id.to_string(),
                    requested,
                    available: product.stock,
                });
            }

            cart.add(product_id, quantity, now);
            self.storage.put_cart_txn(&txn, &cart)?;
        }
        self.storage.commit(txn)?;
        Ok(())
    }

    /// Set a line's quantity (zero removes it).
    pub fn set_quantity(
        &self,
        client_id: &str,
        product_id: &str,
        quantity: u32,
    ) -> CheckoutResult<()> {
        let txn = self.storage.begin_write()?;
        {
            let mut cart = self
                .storage
                .get_cart_txn(&txn, client_id)?
                .ok_or(CheckoutError::EmptyCart)?;

            if quantity > 0 {
                let product = self
                    .storage
                    .get_product_txn(&txn, product_id)?
                    .filter(|p| p.available)
                    .ok_or_else(|| CheckoutError::ProductUnavailable(product_id.to_string()))?;
                if quantity > product.stock {
                    return Err(CheckoutError::InsufficientStock {
                        product_id: product_id.to_string(),
                        requested: quantity,
                        available: product.stock,
                    });
                }
            }

            if !cart.set_quantity(product_id, quantity, now_millis()) {
                return Err(CheckoutError::ProductUnavailable(product_id.to_string()));
            }
            self.storage.put_cart_txn(&txn, &cart)?;
        }
        self.storage.commit(txn)?;
        Ok(())
    }

    pub fn remove_item(&self, client_id: &str, product_id: &str) -> CheckoutResult<()> {
        self.set_quantity(client_id, product_id, 0)
    }

    /// Drop the whole cart.
    pub fn clear(&self, client_id: &str) -> CheckoutResult<()> {
        let txn = self.storage.begin_write()?;
        self.storage.clear_cart_txn(&txn, client_id)?;
        self.storage.commit(txn)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ProductRecord;

    fn service_with_product(stock: u32) -> CartService {
        let storage = CheckoutStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        storage
            .put_product_txn(
                &txn,
                &ProductRecord {
                    id: "p-1".to_string(),
                    name: "Widget".to_string(),
                    price: Decimal::new(1050, 2),
                    stock,
                    available: true,
                },
            )
            .unwrap();
        txn.commit().unwrap();
        CartService::new(storage)
    }

    #[test]
    fn test_add_and_view() {
        let carts = service_with_product(10);
        carts.add_item("c-1", "p-1", 2).unwrap();

        let view = carts.view("c-1").unwrap();
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].quantity, 2);
        assert_eq!(view.total, Decimal::new(2100, 2));
    }

    #[test]
    fn test_add_beyond_stock_rejected() {
        let carts = service_with_product(3);
        carts.add_item("c-1", "p-1", 2).unwrap();

        let err = carts.add_item("c-1", "p-1", 2).unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::InsufficientStock {
                requested: 4,
                available: 3,
                ..
            }
        ));

        // original line untouched
        let view = carts.view("c-1").unwrap();
        assert_eq!(view.items[0].quantity, 2);
    }

    #[test]
    fn test_zero_quantity_add_rejected() {
        let carts = service_with_product(3);
        assert!(matches!(
            carts.add_item("c-1", "p-1", 0),
            Err(CheckoutError::InvalidQuantity(0))
        ));
    }

    #[test]
    fn test_overflowing_quantity_rejected() {
        let carts = service_with_product(u32::MAX);
        carts.add_item("c-1", "p-1", u32::MAX).unwrap();

        let err = carts.add_item("c-1", "p-1", 1).unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidQuantity(1)));
        assert_eq!(carts.view("c-1").unwrap().items[0].quantity, u32::MAX);
    }

    #[test]
    fn test_unknown_product_rejected() {
        let carts = service_with_product(3);
        assert!(matches!(
            carts.add_item("c-1", "nope", 1),
            Err(CheckoutError::ProductUnavailable(_))
        ));
    }

    #[test]
    fn test_set_quantity_and_remove() {
        let carts = service_with_product(10);
        carts.add_item("c-1", "p-1", 2).unwrap();

        carts.set_quantity("c-1", "p-1", 5).unwrap();
        assert_eq!(carts.view("c-1").unwrap().items[0].quantity, 5);

        carts.remove_item("c-1", "p-1").unwrap();
        assert!(carts.view("c-1").unwrap().items.is_empty());
    }

    #[test]
    fn test_clear() {
        let carts = service_with_product(10);
        carts.add_item("c-1", "p-1", 2).unwrap();
        carts.clear("c-1").unwrap();
        assert!(carts.view("c-1").unwrap().items.is_empty());
    }
}
