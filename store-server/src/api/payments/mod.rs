//! Payment verification API
//!
//! Both endpoints resolve a hosted-checkout session against the
//! provider. The return path serves the client's redirect; the webhook
//! covers clients that never come back.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/payments", payment_routes())
}

fn payment_routes() -> Router<ServerState> {
    Router::new()
        .route("/return", get(handler::payment_return))
        .route("/webhook", post(handler::webhook))
}
