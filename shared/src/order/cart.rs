//! Server-authoritative cart
//!
//! One active cart per client, created lazily on first add and mutable
//! until checkout converts it into immutable order items.

use serde::{Deserialize, Serialize};

/// Intended purchase line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartItem {
    pub product_id: String,
    pub quantity: u32,
}

/// Client cart. Stored keyed by client id; the id field exists only so
/// clients can correlate fetches.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Cart {
    pub client_id: String,
    pub items: Vec<CartItem>,
    pub updated_at: i64,
}

impl Cart {
    pub fn new(client_id: impl Into<String>, now: i64) -> Self {
        Self {
            client_id: client_id.into(),
            items: Vec::new(),
            updated_at: now,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add quantity to an existing line or append a new one. The sum
    /// saturates; callers that care reject the overflow before calling.
    pub fn add(&mut self, product_id: &str, quantity: u32, now: i64) {
        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => item.quantity = item.quantity.saturating_add(quantity),
            None => self.items.push(CartItem {
                product_id: product_id.to_string(),
                quantity,
            }),
        }
        self.updated_at = now;
    }

    /// Subtract a purchased quantity from a line, removing it when it
    /// reaches zero. Lines added after the purchase snapshot keep
    /// whatever quantity exceeds the purchase.
    pub fn deduct(&mut self, product_id: &str, quantity: u32, now: i64) {
        let Some(pos) = self.items.iter().position(|i| i.product_id == product_id) else {
            return;
        };
        let remaining = self.items[pos].quantity.saturating_sub(quantity);
        if remaining == 0 {
            self.items.remove(pos);
        } else {
            self.items[pos].quantity = remaining;
        }
        self.updated_at = now;
    }

    /// Set a line's quantity; zero removes the line.
    pub fn set_quantity(&mut self, product_id: &str, quantity: u32, now: i64) -> bool {
        let Some(pos) = self.items.iter().position(|i| i.product_id == product_id) else {
            return false;
        };
        if quantity == 0 {
            self.items.remove(pos);
        } else {
            self.items[pos].quantity = quantity;
        }
        self.updated_at = now;
        true
    }

    pub fn remove(&mut self, product_id: &str, now: i64) -> bool {
        self.set_quantity(product_id, 0, now)
    }
}
