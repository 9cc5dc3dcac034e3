//! Order status events
//!
//! Emitted on every status change for notification collaborators
//! (email, push, dashboards). Fire-and-forget: nobody waits on them.

use super::status::OrderStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    pub order_id: String,
    pub client_id: String,
    pub from: OrderStatus,
    pub to: OrderStatus,
    /// Operator that triggered the change ("system" for the sweep)
    pub actor: String,
    pub timestamp: i64,
}

impl OrderEvent {
    pub fn new(
        order_id: impl Into<String>,
        client_id: impl Into<String>,
        from: OrderStatus,
        to: OrderStatus,
        actor: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            client_id: client_id.into(),
            from,
            to,
            actor: actor.into(),
            timestamp,
        }
    }
}
