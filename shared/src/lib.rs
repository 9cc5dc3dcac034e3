//! Shared domain types for the storefront backend
//!
//! - **order**: order aggregate, cart, payments, status state machines
//! - **models**: product record, actor roles
//! - **response**: unified API envelope

pub mod models;
pub mod order;
pub mod response;
pub mod util;

pub use models::{ProductRecord, ProductUpsert, Role};
pub use order::{
    Cart, CartItem, InvalidTransition, Order, OrderEvent, OrderItem, OrderStatus, Payment,
    PaymentHandle, PaymentMethod, PaymentStatus,
};
pub use response::ApiResponse;
