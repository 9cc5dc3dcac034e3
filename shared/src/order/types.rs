//! Order aggregate
//!
//! Items and `total_amount` are fixed when the order is created from a
//! cart snapshot; only `status` mutates afterwards.

use super::status::OrderStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Immutable order line, priced at snapshot time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub product_id: String,
    /// Product name snapshot (survives later catalog edits)
    pub name: String,
    pub quantity: u32,
    /// Unit price at order time
    pub unit_price: Decimal,
    /// `unit_price * quantity`
    pub subtotal: Decimal,
}

impl OrderItem {
    pub fn new(product_id: impl Into<String>, name: impl Into<String>, quantity: u32, unit_price: Decimal) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            quantity,
            unit_price,
            subtotal: unit_price * Decimal::from(quantity),
        }
    }
}

/// Committed purchase record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub client_id: String,
    pub status: OrderStatus,
    /// Computed once from the item subtotals, never recomputed
    pub total_amount: Decimal,
    pub items: Vec<OrderItem>,
    /// Unix millis
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    /// Build an order from snapshotted items. The total is the sum of
    /// the item subtotals; there is no other total anywhere.
    pub fn from_items(client_id: impl Into<String>, items: Vec<OrderItem>, now: i64) -> Self {
        let total_amount = items.iter().map(|i| i.subtotal).sum();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            client_id: client_id.into(),
            status: OrderStatus::PendingPayment,
            total_amount,
            items,
            created_at: now,
            updated_at: now,
        }
    }

    /// Invariant check: `total_amount == Σ item.subtotal`.
    pub fn total_is_consistent(&self) -> bool {
        self.total_amount == self.items.iter().map(|i| i.subtotal).sum::<Decimal>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn two_line_order() -> Order {
        let items = vec![
            OrderItem::new("p-1", "Widget", 1, d("10.00")),
            OrderItem::new("p-2", "Gadget", 1, d("20.00")),
        ];
        Order::from_items("client-1", items, 1_700_000_000_000)
    }

    #[test]
    fn test_total_is_sum_of_subtotals() {
        let order = two_line_order();
        assert_eq!(order.total_amount, d("30.00"));
        assert!(order.total_is_consistent());
    }

    #[test]
    fn test_subtotal_scales_with_quantity() {
        let item = OrderItem::new("p-1", "Widget", 3, d("2.50"));
        assert_eq!(item.subtotal, d("7.50"));
    }

    #[test]
    fn test_new_order_starts_pending_payment() {
        let order = two_line_order();
        assert_eq!(order.status, OrderStatus::PendingPayment);
        assert!(!order.id.is_empty());
    }
}
