//! Payment orchestration
//!
//! Drives an order from `pending_payment` to `processing` across three
//! methods: hosted gateway checkout, stored-card charge, and cash on
//! delivery. Provider calls happen strictly outside write transactions;
//! state only changes inside them, so a crash mid-call leaves either no
//! record or a pending one the verify path can resolve.

use std::sync::Arc;

use redb::WriteTransaction;
use shared::{
    Order, OrderEvent, OrderStatus, Payment, PaymentHandle, PaymentMethod, PaymentStatus,
    util::now_millis,
};
use tracing::{error, info, warn};

use super::card::{CardVault, ChargeOutcome};
use super::gateway::{PaymentGateway, SessionStatus};
use crate::checkout::error::{CheckoutError, CheckoutResult};
use crate::checkout::fulfillment::{Actor, FulfillmentService, OrderEvents};
use crate::checkout::storage::CheckoutStorage;

/// Placeholder the gateway substitutes in return URLs, Stripe-style.
const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

#[derive(Clone)]
pub struct PaymentCoordinator {
    storage: CheckoutStorage,
    gateway: Arc<dyn PaymentGateway>,
    vault: Arc<dyn CardVault>,
    fulfillment: FulfillmentService,
    events: OrderEvents,
    currency: String,
    frontend_url: String,
}

impl PaymentCoordinator {
    pub fn new(
        storage: CheckoutStorage,
        gateway: Arc<dyn PaymentGateway>,
        vault: Arc<dyn CardVault>,
        fulfillment: FulfillmentService,
        events: OrderEvents,
        currency: impl Into<String>,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            gateway,
            vault,
            fulfillment,
            events,
            currency: currency.into(),
            frontend_url: frontend_url.into(),
        }
    }

    /// Start (or resume) payment for an order the client owns.
    ///
    /// Idempotent on pending payments: a second initiate while one is
    /// outstanding returns the existing handle instead of opening a
    /// second money path. A failed payment is terminal; retrying
    /// creates a fresh record.
    pub async fn initiate_payment(
        &self,
        client_id: &str,
        order_id: &str,
        method: PaymentMethod,
        card_token: Option<&str>,
    ) -> CheckoutResult<PaymentHandle> {
        let order = self.payable_order(client_id, order_id)?;

        if let Some(existing) = self.storage.get_payment_by_order(order_id)? {
            if existing.status == PaymentStatus::Pending {
                info!(order_id = %order_id, payment_id = %existing.id, "payment already in progress");
                return Ok(PaymentHandle::from_payment(&existing));
            }
        }

        match method {
            PaymentMethod::Gateway => self.initiate_gateway(&order).await,
            PaymentMethod::StoredCard => {
                let token = card_token.ok_or_else(|| {
                    CheckoutError::CardDeclined("missing card token".to_string())
                })?;
                self.initiate_stored_card(&order, token).await
            }
            PaymentMethod::CashOnDelivery => self.initiate_cash_on_delivery(&order),
        }
    }

    /// Resolve a hosted-checkout session against the provider's view.
    ///
    /// Serves both the client return redirect and provider webhooks, so
    /// it must be idempotent: only a pending payment is moved, and only
    /// when the provider confirms the session paid. Repeats are no-ops.
    pub async fn verify_session(&self, session_id: &str) -> CheckoutResult<PaymentHandle> {
        let status = self
            .gateway
            .fetch_session_status(session_id)
            .await
            .map_err(|e| CheckoutError::GatewayUnavailable(e.to_string()))?;

        let txn = self.storage.begin_write()?;
        let mut payment = self
            .storage
            .get_payment_by_session_txn(&txn, session_id)?
            .ok_or_else(|| CheckoutError::PaymentNotFound(session_id.to_string()))?;

        if payment.status != PaymentStatus::Pending {
            // already resolved by an earlier verify or webhook
            drop(txn);
            return Ok(PaymentHandle::from_payment(&payment));
        }

        match status {
            SessionStatus::Paid => {
                let now = now_millis();
                payment.status = PaymentStatus::Paid;
                payment.confirmed_at = Some(now);
                self.storage.put_payment_txn(&txn, &payment)?;
                let event = self.promote_paid_order_txn(&txn, &payment.order_id, now)?;
                self.storage.commit(txn)?;
                info!(order_id = %payment.order_id, session_id = %session_id, "gateway payment confirmed");
                self.events.emit(event);
                Ok(PaymentHandle::from_payment(&payment))
            }
            SessionStatus::Expired => {
                payment.status = PaymentStatus::Failed;
                self.storage.put_payment_txn(&txn, &payment)?;
                self.storage.commit(txn)?;
                warn!(order_id = %payment.order_id, session_id = %session_id, "gateway session expired");
                Ok(PaymentHandle::from_payment(&payment))
            }
            SessionStatus::Open => {
                drop(txn);
                Ok(PaymentHandle::from_payment(&payment))
            }
        }
    }

    /// Payment record for an order the client owns.
    pub fn payment_for_order(&self, client_id: &str, order_id: &str) -> CheckoutResult<Payment> {
        let order = self
            .storage
            .get_order(order_id)?
            .ok_or_else(|| CheckoutError::OrderNotFound(order_id.to_string()))?;
        if order.client_id != client_id {
            return Err(CheckoutError::Forbidden(
                "not allowed to view this order".to_string(),
            ));
        }
        self.storage
            .get_payment_by_order(order_id)?
            .ok_or_else(|| CheckoutError::PaymentNotFound(order_id.to_string()))
    }

    async fn initiate_gateway(&self, order: &Order) -> CheckoutResult<PaymentHandle> {
        let success_url = format!(
            "{}/payments/return?order_id={}&session_id={}",
            self.frontend_url, order.id, SESSION_ID_PLACEHOLDER
        );
        let cancel_url = format!("{}/orders/{}?payment=cancelled", self.frontend_url, order.id);

        // provider call happens before any record exists; on failure
        // the reservation is released so stock does not sit behind an
        // order nobody can pay for
        let session = match self
            .gateway
            .create_checkout_session(order, &self.currency, &success_url, &cancel_url)
            .await
        {
            Ok(session) => session,
            Err(e) => {
                error!(order_id = %order.id, error = %e, "gateway session create failed, releasing order");
                self.fulfillment.cancel_order(&order.id, &Actor::System)?;
                return Err(CheckoutError::GatewayUnavailable(e.to_string()));
            }
        };

        let mut payment = Payment::new(&order.id, PaymentMethod::Gateway, order.total_amount, now_millis());
        payment.external_reference = Some(session.session_id.clone());
        payment.redirect_url = Some(session.redirect_url.clone());

        let txn = self.storage.begin_write()?;
        if let Some(existing) = self.existing_pending_payment_txn(&txn, &order.id)? {
            // a concurrent initiate won the race during the provider
            // call; its session stays live, ours is left to expire
            drop(txn);
            warn!(order_id = %order.id, abandoned_session = %session.session_id, "concurrent initiate raced, reusing existing payment");
            return Ok(PaymentHandle::from_payment(&existing));
        }
        self.require_pending_payment_txn(&txn, &order.id)?;
        self.storage.put_payment_txn(&txn, &payment)?;
        self.storage.commit(txn)?;

        info!(order_id = %order.id, session_id = %session.session_id, "gateway session created");
        Ok(PaymentHandle::from_payment(&payment))
    }

    async fn initiate_stored_card(&self, order: &Order, token: &str) -> CheckoutResult<PaymentHandle> {
        let outcome = self
            .vault
            .charge(token, order.total_amount, &self.currency, &order.id)
            .await
            .map_err(|e| CheckoutError::GatewayUnavailable(e.to_string()))?;

        let now = now_millis();
        let mut payment = Payment::new(&order.id, PaymentMethod::StoredCard, order.total_amount, now);

        match outcome {
            ChargeOutcome::Approved(charge_id) => {
                payment.status = PaymentStatus::Paid;
                payment.external_reference = Some(charge_id);
                payment.confirmed_at = Some(now);

                let txn = self.storage.begin_write()?;
                // a gateway session may have opened during the charge;
                // the charge is the authoritative capture, so that
                // session's record is closed out
                if let Some(mut stale) = self.existing_pending_payment_txn(&txn, &order.id)? {
                    warn!(order_id = %order.id, superseded = %stale.id, "pending payment superseded by approved charge");
                    stale.status = PaymentStatus::Failed;
                    self.storage.put_payment_txn(&txn, &stale)?;
                }
                if let Err(e) = self.require_pending_payment_txn(&txn, &order.id) {
                    error!(order_id = %order.id, charge = ?payment.external_reference, "approved charge against an order no longer payable, manual reconciliation required");
                    return Err(e);
                }
                self.storage.put_payment_txn(&txn, &payment)?;
                let event = self.promote_paid_order_txn(&txn, &order.id, now)?;
                self.storage.commit(txn)?;

                info!(order_id = %order.id, "stored-card charge approved");
                self.events.emit(event);
                Ok(PaymentHandle::from_payment(&payment))
            }
            ChargeOutcome::Declined(reason) => {
                // terminal failure record for the audit trail; the
                // order stays payable so the client can retry
                payment.status = PaymentStatus::Failed;

                let txn = self.storage.begin_write()?;
                if self.existing_pending_payment_txn(&txn, &order.id)?.is_some() {
                    // keep the order's payment pointer on the live
                    // record a concurrent initiate committed
                    drop(txn);
                    warn!(order_id = %order.id, reason = %reason, "stored-card charge declined, concurrent payment already pending");
                    return Err(CheckoutError::CardDeclined(reason));
                }
                self.require_pending_payment_txn(&txn, &order.id)?;
                self.storage.put_payment_txn(&txn, &payment)?;
                self.storage.commit(txn)?;

                warn!(order_id = %order.id, reason = %reason, "stored-card charge declined");
                Err(CheckoutError::CardDeclined(reason))
            }
        }
    }

    /// No upfront capture; the order moves to processing immediately
    /// and the payment settles when delivery is confirmed.
    fn initiate_cash_on_delivery(&self, order: &Order) -> CheckoutResult<PaymentHandle> {
        let now = now_millis();
        let payment = Payment::new(&order.id, PaymentMethod::CashOnDelivery, order.total_amount, now);

        let txn = self.storage.begin_write()?;
        if let Some(existing) = self.existing_pending_payment_txn(&txn, &order.id)? {
            drop(txn);
            info!(order_id = %order.id, payment_id = %existing.id, "payment already in progress");
            return Ok(PaymentHandle::from_payment(&existing));
        }
        self.require_pending_payment_txn(&txn, &order.id)?;
        self.storage.put_payment_txn(&txn, &payment)?;
        let event = self.promote_paid_order_txn(&txn, &order.id, now)?;
        self.storage.commit(txn)?;

        info!(order_id = %order.id, "cash-on-delivery accepted");
        self.events.emit(event);
        Ok(PaymentHandle::from_payment(&payment))
    }

    /// Move the order to `processing`, stop the payment-timeout clock,
    /// and deduct the purchased lines from the client's cart. Called
    /// only with a settled (or COD) payment in the same transaction.
    fn promote_paid_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
        now: i64,
    ) -> CheckoutResult<OrderEvent> {
        let mut order = self
            .storage
            .get_order_txn(txn, order_id)?
            .ok_or_else(|| CheckoutError::OrderNotFound(order_id.to_string()))?;

        let from = order.status;
        from.verify_transition(OrderStatus::Processing)?;
        order.status = OrderStatus::Processing;
        order.updated_at = now;
        self.storage.put_order_txn(txn, &order)?;
        self.storage.clear_pending_txn(txn, order_id)?;

        // drop only the purchased quantities; lines the client added
        // after checkout stay in the cart
        if let Some(mut cart) = self.storage.get_cart_txn(txn, &order.client_id)? {
            for item in &order.items {
                cart.deduct(&item.product_id, item.quantity, now);
            }
            self.storage.put_cart_txn(txn, &cart)?;
        }

        Ok(OrderEvent::new(
            order_id,
            &order.client_id,
            from,
            OrderStatus::Processing,
            "payment",
            now,
        ))
    }

    /// Ownership and status gate for initiate.
    fn payable_order(&self, client_id: &str, order_id: &str) -> CheckoutResult<Order> {
        let order = self
            .storage
            .get_order(order_id)?
            .ok_or_else(|| CheckoutError::OrderNotFound(order_id.to_string()))?;
        if order.client_id != client_id {
            return Err(CheckoutError::Forbidden(
                "not allowed to pay for this order".to_string(),
            ));
        }
        if order.status != OrderStatus::PendingPayment {
            return Err(CheckoutError::OrderNotPayable(order.status.as_str().to_string()));
        }
        Ok(order)
    }

    /// In-transaction half of the idempotency gate. The pre-flight
    /// check runs before the provider call, and a concurrent initiate
    /// can commit during that call; the winner's pending payment is
    /// the one that must survive.
    fn existing_pending_payment_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> CheckoutResult<Option<Payment>> {
        Ok(self
            .storage
            .get_payment_by_order_txn(txn, order_id)?
            .filter(|p| p.status == PaymentStatus::Pending))
    }

    /// Re-check inside the write transaction: the order must still be
    /// awaiting payment (the sweep may have cancelled it since the
    /// provider call started).
    fn require_pending_payment_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> CheckoutResult<()> {
        let order = self
            .storage
            .get_order_txn(txn, order_id)?
            .ok_or_else(|| CheckoutError::OrderNotFound(order_id.to_string()))?;
        if order.status != OrderStatus::PendingPayment {
            return Err(CheckoutError::OrderNotPayable(order.status.as_str().to_string()));
        }
        Ok(())
    }
}
