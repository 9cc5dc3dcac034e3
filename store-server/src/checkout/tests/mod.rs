use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::{Order, ProductRecord};

use super::cart::CartService;
use super::create_order::CheckoutService;
use super::fulfillment::{FulfillmentService, OrderEvents};
use super::payment::card::{CardVault, ChargeOutcome};
use super::payment::coordinator::PaymentCoordinator;
use super::payment::gateway::{CheckoutSession, GatewayError, PaymentGateway, SessionStatus};
use super::storage::CheckoutStorage;

// ========================================================================
// Scripted provider doubles
// ========================================================================

pub struct MockGateway {
    /// Next create_checkout_session call fails when set
    pub fail_create: Mutex<bool>,
    /// What fetch_session_status reports for any known session
    pub session_status: Mutex<SessionStatus>,
    /// Simulated provider latency on session creation
    create_delay: Mutex<Duration>,
    sessions: Mutex<Vec<String>>,
    counter: AtomicU32,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            fail_create: Mutex::new(false),
            session_status: Mutex::new(SessionStatus::Open),
            create_delay: Mutex::new(Duration::ZERO),
            sessions: Mutex::new(Vec::new()),
            counter: AtomicU32::new(0),
        }
    }

    pub fn set_status(&self, status: SessionStatus) {
        *self.session_status.lock().unwrap() = status;
    }

    pub fn set_create_delay(&self, delay: Duration) {
        *self.create_delay.lock().unwrap() = delay;
    }

    pub fn created_sessions(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_checkout_session(
        &self,
        _order: &Order,
        _currency: &str,
        _success_url: &str,
        _cancel_url: &str,
    ) -> Result<CheckoutSession, GatewayError> {
        if *self.fail_create.lock().unwrap() {
            return Err(GatewayError::Rejected("provider down".to_string()));
        }
        let delay = *self.create_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let session_id = format!("sess-{n}");
        self.sessions.lock().unwrap().push(session_id.clone());
        Ok(CheckoutSession {
            redirect_url: format!("https://gateway.test/pay/{session_id}"),
            session_id,
        })
    }

    async fn fetch_session_status(&self, session_id: &str) -> Result<SessionStatus, GatewayError> {
        if !self.sessions.lock().unwrap().iter().any(|s| s == session_id) {
            return Err(GatewayError::UnknownSession(session_id.to_string()));
        }
        Ok(*self.session_status.lock().unwrap())
    }
}

pub enum VaultBehavior {
    Approve,
    Decline(String),
    Unavailable,
}

pub struct MockVault {
    pub behavior: Mutex<VaultBehavior>,
    counter: AtomicU32,
}

impl MockVault {
    pub fn new() -> Self {
        Self {
            behavior: Mutex::new(VaultBehavior::Approve),
            counter: AtomicU32::new(0),
        }
    }

    pub fn set_behavior(&self, behavior: VaultBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }
}

#[async_trait]
impl CardVault for MockVault {
    async fn charge(
        &self,
        _card_token: &str,
        _amount: Decimal,
        _currency: &str,
        _reference: &str,
    ) -> Result<ChargeOutcome, GatewayError> {
        match &*self.behavior.lock().unwrap() {
            VaultBehavior::Approve => {
                let n = self.counter.fetch_add(1, Ordering::SeqCst);
                Ok(ChargeOutcome::Approved(format!("ch-{n}")))
            }
            VaultBehavior::Decline(reason) => Ok(ChargeOutcome::Declined(reason.clone())),
            VaultBehavior::Unavailable => Err(GatewayError::Rejected("vault down".to_string())),
        }
    }
}

// ========================================================================
// Test environment
// ========================================================================

pub struct TestEnv {
    pub storage: CheckoutStorage,
    pub carts: CartService,
    pub checkout: CheckoutService,
    pub fulfillment: FulfillmentService,
    pub coordinator: PaymentCoordinator,
    pub gateway: Arc<MockGateway>,
    pub vault: Arc<MockVault>,
    pub events: OrderEvents,
}

pub fn test_env() -> TestEnv {
    let storage = CheckoutStorage::open_in_memory().unwrap();
    let events = OrderEvents::default();
    let gateway = Arc::new(MockGateway::new());
    let vault = Arc::new(MockVault::new());
    let fulfillment = FulfillmentService::new(storage.clone(), events.clone());
    let coordinator = PaymentCoordinator::new(
        storage.clone(),
        gateway.clone(),
        vault.clone(),
        fulfillment.clone(),
        events.clone(),
        "eur",
        "https://shop.test",
    );

    seed_product(&storage, "p-1", "10.00", 5);
    seed_product(&storage, "p-2", "2.50", 5);

    TestEnv {
        carts: CartService::new(storage.clone()),
        checkout: CheckoutService::new(storage.clone()),
        fulfillment,
        coordinator,
        gateway,
        vault,
        events,
        storage,
    }
}

pub fn seed_product(storage: &CheckoutStorage, id: &str, price: &str, stock: u32) {
    let txn = storage.begin_write().unwrap();
    storage
        .put_product_txn(
            &txn,
            &ProductRecord {
                id: id.to_string(),
                name: format!("Product {id}"),
                price: price.parse().unwrap(),
                stock,
                available: true,
            },
        )
        .unwrap();
    txn.commit().unwrap();
}

/// Cart with two lines, checked out to a pending_payment order.
pub fn place_order(env: &TestEnv, client_id: &str) -> Order {
    env.carts.add_item(client_id, "p-1", 2).unwrap();
    env.carts.add_item(client_id, "p-2", 1).unwrap();
    env.checkout.create_order(client_id).unwrap()
}

pub fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

mod test_card_and_cod;
mod test_concurrency;
