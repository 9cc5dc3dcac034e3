//! Payment records
//!
//! Exactly one non-terminal payment per order at a time. A failed or
//! refunded payment is terminal; a retry creates a fresh record.

use super::status::PaymentStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Closed set of supported payment methods
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Hosted checkout at the external gateway, confirmed asynchronously
    Gateway,
    /// Synchronous charge against a stored card token
    StoredCard,
    /// No upfront capture; settles on delivery
    CashOnDelivery,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Gateway => "gateway",
            PaymentMethod::StoredCard => "stored_card",
            PaymentMethod::CashOnDelivery => "cash_on_delivery",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Money-movement attempt tied to one order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub amount: Decimal,
    /// Gateway session id or vault charge id (None for COD)
    pub external_reference: Option<String>,
    /// Hosted-checkout URL, kept so a repeated initiate can hand back
    /// the same session
    pub redirect_url: Option<String>,
    pub created_at: i64,
    pub confirmed_at: Option<i64>,
}

impl Payment {
    pub fn new(order_id: impl Into<String>, method: PaymentMethod, amount: Decimal, now: i64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            order_id: order_id.into(),
            method,
            status: PaymentStatus::Pending,
            amount,
            external_reference: None,
            redirect_url: None,
            created_at: now,
            confirmed_at: None,
        }
    }
}

/// What `initiate_payment` hands back to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentHandle {
    pub payment_id: String,
    pub order_id: String,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// Hosted-checkout URL for the gateway method; None otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

impl PaymentHandle {
    pub fn from_payment(payment: &Payment) -> Self {
        Self {
            payment_id: payment.id.clone(),
            order_id: payment.order_id.clone(),
            method: payment.method,
            status: payment.status,
            redirect_url: payment.redirect_url.clone(),
        }
    }
}
