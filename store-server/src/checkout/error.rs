//! Checkout error taxonomy
//!
//! One enum for every failure the order/payment core can produce,
//! mapped onto [`AppError`] at the HTTP boundary. Money paths fail
//! closed: on uncertainty the system records no charge and surfaces a
//! retryable error instead of risking a duplicate capture.

use super::storage::StorageError;
use crate::utils::AppError;
use shared::InvalidTransition;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    #[error("Product unavailable: {0}")]
    ProductUnavailable(String),

    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: u32,
        available: u32,
    },

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    #[error("Order is not awaiting payment (status: {0})")]
    OrderNotPayable(String),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("Payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("Card charge declined: {0}")]
    CardDeclined(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type CheckoutResult<T> = Result<T, CheckoutError>;

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::EmptyCart => AppError::Validation("Cart is empty".into()),
            CheckoutError::InvalidQuantity(q) => {
                AppError::Validation(format!("Invalid quantity: {q}"))
            }
            CheckoutError::ProductUnavailable(id) => {
                AppError::Validation(format!("Product unavailable: {id}"))
            }
            CheckoutError::InsufficientStock {
                product_id,
                requested,
                available,
            } => AppError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            CheckoutError::OrderNotFound(id) => AppError::NotFound(format!("Order {id} not found")),
            CheckoutError::PaymentNotFound(id) => {
                AppError::NotFound(format!("Payment for order {id} not found"))
            }
            CheckoutError::OrderNotPayable(status) => {
                AppError::Conflict(format!("Order is not awaiting payment (status: {status})"))
            }
            CheckoutError::InvalidTransition(t) => AppError::Conflict(t.to_string()),
            CheckoutError::GatewayUnavailable(msg) => AppError::GatewayUnavailable(msg),
            CheckoutError::CardDeclined(msg) => {
                AppError::Validation(format!("Card charge declined: {msg}"))
            }
            CheckoutError::Forbidden(msg) => AppError::Forbidden(msg),
            CheckoutError::Storage(e) => AppError::Storage(e.to_string()),
        }
    }
}
