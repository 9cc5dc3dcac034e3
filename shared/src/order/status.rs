//! Order and payment lifecycle states
//!
//! Order status mutations go through [`OrderStatus::verify_transition`];
//! callers never write the field from a hand-rolled check. Payment status
//! changes are narrower and are guarded at each call site, with
//! [`PaymentStatus::verify_transition`] as the reference table.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected status change, carrying both endpoints for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: String,
    pub to: String,
}

/// Order lifecycle status
///
/// ```text
/// pending_payment ──> processing ──> shipped ──> delivered
///        │                 │
///        └──> cancelled <──┘
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created from a cart, payment not yet resolved
    #[default]
    PendingPayment,
    /// Payment resolved favorably (or COD accepted), fulfillment may begin
    Processing,
    /// Handed to the carrier; stock is permanently consumed
    Shipped,
    /// Terminal
    Delivered,
    /// Terminal
    Cancelled,
}

impl OrderStatus {
    /// Whether `self -> to` appears in the legal transition table.
    pub fn can_transition_to(self, to: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, to),
            (PendingPayment, Processing)
                | (PendingPayment, Cancelled)
                | (Processing, Shipped)
                | (Processing, Cancelled)
                | (Shipped, Delivered)
        )
    }

    /// Validate a transition, returning the rejected pair on failure.
    pub fn verify_transition(self, to: OrderStatus) -> Result<(), InvalidTransition> {
        if self.can_transition_to(to) {
            Ok(())
        } else {
            Err(InvalidTransition {
                from: self.as_str().to_string(),
                to: to.as_str().to_string(),
            })
        }
    }

    /// Orders may only be cancelled before shipment.
    pub fn is_cancellable(self) -> bool {
        self.can_transition_to(OrderStatus::Cancelled)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "pending_payment",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::PendingPayment,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment sub-state, independent of the order status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// `pending` may resolve to any outcome; `paid` may only be refunded.
    pub fn can_transition_to(self, to: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, to),
            (Pending, Paid) | (Pending, Failed) | (Pending, Refunded) | (Paid, Refunded)
        )
    }

    pub fn verify_transition(self, to: PaymentStatus) -> Result<(), InvalidTransition> {
        if self.can_transition_to(to) {
            Ok(())
        } else {
            Err(InvalidTransition {
                from: self.as_str().to_string(),
                to: to.as_str().to_string(),
            })
        }
    }

    /// Terminal payments never change again; a new attempt needs a new record.
    pub fn is_terminal(self) -> bool {
        matches!(self, PaymentStatus::Failed | PaymentStatus::Refunded)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_order_transitions() {
        use OrderStatus::*;
        assert!(PendingPayment.can_transition_to(Processing));
        assert!(PendingPayment.can_transition_to(Cancelled));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Processing.can_transition_to(Cancelled));
        assert!(Shipped.can_transition_to(Delivered));
    }

    #[test]
    fn test_every_pair_outside_table_is_rejected() {
        use OrderStatus::*;
        let legal = [
            (PendingPayment, Processing),
            (PendingPayment, Cancelled),
            (Processing, Shipped),
            (Processing, Cancelled),
            (Shipped, Delivered),
        ];

        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                let expect_ok = legal.contains(&(from, to));
                assert_eq!(
                    from.verify_transition(to).is_ok(),
                    expect_ok,
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_shipped_is_not_cancellable() {
        assert!(!OrderStatus::Shipped.is_cancellable());
        assert!(!OrderStatus::Delivered.is_cancellable());
        assert!(OrderStatus::PendingPayment.is_cancellable());
        assert!(OrderStatus::Processing.is_cancellable());
    }

    #[test]
    fn test_skipping_shipped_is_rejected() {
        let err = OrderStatus::Processing
            .verify_transition(OrderStatus::Delivered)
            .unwrap_err();
        assert_eq!(err.from, "processing");
        assert_eq!(err.to, "delivered");
    }

    #[test]
    fn test_payment_transitions() {
        use PaymentStatus::*;
        assert!(Pending.can_transition_to(Paid));
        assert!(Pending.can_transition_to(Failed));
        assert!(Paid.can_transition_to(Refunded));
        assert!(!Paid.can_transition_to(Pending));
        assert!(!Failed.can_transition_to(Paid));
        assert!(!Refunded.can_transition_to(Pending));
    }

    #[test]
    fn test_status_serde_wire_format() {
        let json = serde_json::to_string(&OrderStatus::PendingPayment).unwrap();
        assert_eq!(json, "\"pending_payment\"");
        let back: OrderStatus = serde_json::from_str("\"shipped\"").unwrap();
        assert_eq!(back, OrderStatus::Shipped);
    }
}
