//! Order lifecycle after payment
//!
//! Staff advance orders through shipping; clients and the timeout sweep
//! cancel them. Every committed status change is broadcast as an
//! [`OrderEvent`] for notification listeners.

use super::error::{CheckoutError, CheckoutResult};
use super::storage::CheckoutStorage;
use redb::WriteTransaction;
use shared::{
    Order, OrderEvent, OrderStatus, PaymentMethod, PaymentStatus, Role, util::now_millis,
};
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Who is asking for a status change.
#[derive(Debug, Clone)]
pub enum Actor {
    Client(String),
    Staff { id: String, role: Role },
    /// Background jobs (payment-timeout sweep)
    System,
}

impl Actor {
    pub fn label(&self) -> String {
        match self {
            Actor::Client(id) => format!("client:{id}"),
            Actor::Staff { id, .. } => format!("staff:{id}"),
            Actor::System => "system".to_string(),
        }
    }

    fn can_fulfill(&self) -> bool {
        matches!(self, Actor::Staff { role, .. } if role.can_fulfill())
    }

    fn may_cancel(&self, order: &Order) -> bool {
        match self {
            Actor::Client(id) => order.client_id == *id,
            Actor::Staff { role, .. } => *role == Role::Admin,
            Actor::System => true,
        }
    }
}

/// Broadcast fan-out for order status changes. Fire-and-forget; a send
/// with no subscribers is not an error.
#[derive(Clone)]
pub struct OrderEvents {
    sender: broadcast::Sender<OrderEvent>,
}

impl OrderEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: OrderEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for OrderEvents {
    fn default() -> Self {
        Self::new(256)
    }
}

#[derive(Clone)]
pub struct FulfillmentService {
    storage: CheckoutStorage,
    events: OrderEvents,
}

impl FulfillmentService {
    pub fn new(storage: CheckoutStorage, events: OrderEvents) -> Self {
        Self { storage, events }
    }

    /// Move a paid order through the fulfillment chain. Only
    /// `shipped` and `delivered` are reachable here: payment owns the
    /// promotion to `processing` and cancellation has its own path.
    pub fn advance_status(
        &self,
        order_id: &str,
        actor: &Actor,
        new_status: OrderStatus,
    ) -> CheckoutResult<Order> {
        if !actor.can_fulfill() {
            return Err(CheckoutError::Forbidden(
                "fulfillment requires seller or admin role".to_string(),
            ));
        }
        if !matches!(new_status, OrderStatus::Shipped | OrderStatus::Delivered) {
            return Err(CheckoutError::Forbidden(format!(
                "status {new_status:?} is not set through fulfillment"
            )));
        }

        let txn = self.storage.begin_write()?;
        let mut order = self
            .storage
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| CheckoutError::OrderNotFound(order_id.to_string()))?;

        let from = order.status;
        from.verify_transition(new_status)?;
        let now = now_millis();
        order.status = new_status;
        order.updated_at = now;
        self.storage.put_order_txn(&txn, &order)?;

        // settle cash-on-delivery at the door
        if new_status == OrderStatus::Delivered {
            if let Some(mut payment) = self.storage.get_payment_by_order_txn(&txn, order_id)? {
                if payment.method == PaymentMethod::CashOnDelivery
                    && payment.status == PaymentStatus::Pending
                {
                    payment.status = PaymentStatus::Paid;
                    payment.confirmed_at = Some(now);
                    self.storage.put_payment_txn(&txn, &payment)?;
                }
            }
        }
        self.storage.commit(txn)?;

        info!(order_id = %order_id, from = %from.as_str(), to = %new_status.as_str(), "order advanced");
        self.events.emit(OrderEvent::new(
            order_id,
            &order.client_id,
            from,
            new_status,
            actor.label(),
            now,
        ));
        Ok(order)
    }

    /// Cancel a not-yet-shipped order: restore reserved stock and
    /// resolve its payment (pending becomes failed, paid becomes
    /// refunded). Clients may cancel their own orders; admins and the
    /// sweep may cancel any.
    pub fn cancel_order(&self, order_id: &str, actor: &Actor) -> CheckoutResult<Order> {
        let txn = self.storage.begin_write()?;
        let order = self
            .storage
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| CheckoutError::OrderNotFound(order_id.to_string()))?;

        if !actor.may_cancel(&order) {
            return Err(CheckoutError::Forbidden(
                "not allowed to cancel this order".to_string(),
            ));
        }
        order.status.verify_transition(OrderStatus::Cancelled)?;
        self.finish_cancel(txn, order, actor)
    }

    /// Timeout-sweep entry point. The pending listing the sweep walks
    /// is a stale snapshot, so the awaiting-payment check is repeated
    /// here inside the write transaction: an order whose payment
    /// confirmed in the meantime is left alone and `Ok(None)` comes
    /// back.
    pub fn cancel_if_pending_payment(&self, order_id: &str) -> CheckoutResult<Option<Order>> {
        let txn = self.storage.begin_write()?;
        let order = self
            .storage
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| CheckoutError::OrderNotFound(order_id.to_string()))?;

        if order.status != OrderStatus::PendingPayment {
            drop(txn);
            return Ok(None);
        }
        self.finish_cancel(txn, order, &Actor::System).map(Some)
    }

    /// Shared cancel body. Callers have already authorized the actor
    /// and checked the transition against the order read in `txn`.
    fn finish_cancel(
        &self,
        txn: WriteTransaction,
        mut order: Order,
        actor: &Actor,
    ) -> CheckoutResult<Order> {
        let from = order.status;

        // return every reserved line; delisted products keep their
        // stock corrected even though they cannot be sold
        for item in &order.items {
            if let Some(mut product) = self.storage.get_product_txn(&txn, &item.product_id)? {
                product.stock += item.quantity;
                self.storage.put_product_txn(&txn, &product)?;
            } else {
                warn!(order_id = %order.id, product_id = %item.product_id, "cancelled line references missing product");
            }
        }

        let now = now_millis();
        if let Some(mut payment) = self.storage.get_payment_by_order_txn(&txn, &order.id)? {
            match payment.status {
                PaymentStatus::Pending => {
                    payment.status = PaymentStatus::Failed;
                    self.storage.put_payment_txn(&txn, &payment)?;
                }
                PaymentStatus::Paid => {
                    payment.status = PaymentStatus::Refunded;
                    payment.confirmed_at = Some(now);
                    self.storage.put_payment_txn(&txn, &payment)?;
                }
                PaymentStatus::Failed | PaymentStatus::Refunded => {}
            }
        }

        order.status = OrderStatus::Cancelled;
        order.updated_at = now;
        self.storage.put_order_txn(&txn, &order)?;
        self.storage.clear_pending_txn(&txn, &order.id)?;
        self.storage.commit(txn)?;

        info!(order_id = %order.id, actor = %actor.label(), "order cancelled");
        self.events.emit(OrderEvent::new(
            &order.id,
            &order.client_id,
            from,
            OrderStatus::Cancelled,
            actor.label(),
            now,
        ));
        Ok(order)
    }
}
