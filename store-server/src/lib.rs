//! Store Server - order, payment and fulfillment core
//!
//! # Module structure
//!
//! ```text
//! store-server/src/
//! ├── core/          # configuration, server state
//! ├── auth/          # JWT validation, CurrentUser extractor
//! ├── checkout/      # carts, orders, payments, fulfillment, storage
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # errors, logging
//! ```
//!
//! The interesting invariants live in [`checkout`]: stock can never go
//! negative, an order's total never changes after creation, and every
//! status change passes the transition table in `shared`.

pub mod api;
pub mod auth;
pub mod checkout;
pub mod core;
pub mod utils;

pub use auth::{CurrentUser, JwtService};
pub use checkout::{
    CartService, CheckoutService, CheckoutStorage, FulfillmentService, OrderEvents,
    PaymentCoordinator, PaymentTimeoutSweeper,
};
pub use core::{Config, ServerState};
pub use utils::{AppError, AppResult};
pub use utils::logger::{init_logger, init_logger_with_file};
