//! HTTP API
//!
//! # Routes
//!
//! | Path | Methods | Auth |
//! |------|---------|------|
//! | /health | GET | none |
//! | /api/cart | GET | client |
//! | /api/cart/items | POST | client |
//! | /api/cart/items/{product_id} | PUT, DELETE | client |
//! | /api/orders | GET, POST | client |
//! | /api/orders/{id} | GET | client |
//! | /api/orders/{id}/cancel | POST | client or admin |
//! | /api/orders/{id}/status | PATCH | seller or admin |
//! | /api/orders/{id}/payment | GET, POST | client |
//! | /api/payments/return | GET | none (session id is the capability) |
//! | /api/payments/webhook | POST | gateway signature |
//! | /api/products/{id} | GET, PUT | any / admin |

pub mod cart;
pub mod health;
pub mod orders;
pub mod payments;
pub mod products;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

/// Full application router with middleware layers.
pub fn build_router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(cart::router())
        .merge(orders::router())
        .merge(payments::router())
        .merge(products::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
