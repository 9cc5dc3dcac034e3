//! Product catalog API
//!
//! The catalog of record lives upstream; this surface exists so the
//! upstream sync (or an admin) can push price, stock and availability
//! into the checkout store.

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/products", product_routes())
}

fn product_routes() -> Router<ServerState> {
    Router::new().route("/{id}", get(handler::get_by_id).put(handler::upsert))
}
