//! Order, Payment and Fulfillment Core
//!
//! This module implements the transactional commerce pipeline:
//!
//! - **cart**: server-authoritative cart mutations
//! - **create_order**: cart-to-order conversion with stock reservation
//! - **payment**: gateway / stored-card / cash-on-delivery orchestration
//! - **fulfillment**: staff status advancement and cancellation
//! - **sweep**: background cancellation of timed-out pending payments
//! - **storage**: redb-based persistence for products, carts, orders
//!   and payments
//!
//! # Architecture
//!
//! ```text
//! Cart → CheckoutService → Order (pending_payment) + stock reserved
//!                ↓
//!        PaymentCoordinator ←→ gateway / card vault (HTTP)
//!                ↓
//!        Order (processing) → FulfillmentService → shipped → delivered
//!                ↓
//!           Broadcast (OrderEvent)
//! ```
//!
//! # Transaction discipline
//!
//! All multi-record changes go through a single redb write transaction.
//! redb's single-writer model serializes competing checkouts, so a
//! stock check and its decrement are atomic by construction. Provider
//! HTTP calls never happen while a write transaction is open.

pub mod cart;
pub mod create_order;
pub mod error;
pub mod fulfillment;
pub mod payment;
pub mod storage;
pub mod sweep;

#[cfg(test)]
mod tests;

pub use cart::{CartService, CartView};
pub use create_order::CheckoutService;
pub use error::{CheckoutError, CheckoutResult};
pub use fulfillment::{Actor, FulfillmentService, OrderEvents};
pub use payment::{
    CardVault, HttpCardVault, HttpGateway, PaymentCoordinator, PaymentGateway,
};
pub use storage::{CheckoutStorage, StorageError};
pub use sweep::PaymentTimeoutSweeper;
