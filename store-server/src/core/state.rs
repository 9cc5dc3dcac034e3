//! Server state
//!
//! One `ServerState` per process, cloned into every handler. All
//! services share the same [`CheckoutStorage`] handle, so every write
//! goes through the single redb writer.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::auth::JwtService;
use crate::checkout::payment::{HttpCardVault, HttpGateway};
use crate::checkout::{
    CartService, CheckoutService, CheckoutStorage, FulfillmentService, OrderEvents,
    PaymentCoordinator, PaymentTimeoutSweeper,
};
use crate::core::Config;
use crate::utils::AppError;

#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub storage: CheckoutStorage,
    pub carts: CartService,
    pub checkout: CheckoutService,
    pub payments: PaymentCoordinator,
    pub fulfillment: FulfillmentService,
    pub events: OrderEvents,
    pub jwt: Arc<JwtService>,
    /// Propagated to background tasks on shutdown
    pub shutdown: CancellationToken,
}

impl ServerState {
    /// Open storage and wire every service. The returned state is ready
    /// to serve; background tasks start separately via
    /// [`ServerState::spawn_background_tasks`].
    pub fn initialize(config: Config) -> Result<Self, AppError> {
        let storage = CheckoutStorage::open(config.db_path())
            .map_err(|e| AppError::Storage(e.to_string()))?;
        Ok(Self::with_storage(config, storage))
    }

    pub fn with_storage(config: Config, storage: CheckoutStorage) -> Self {
        let events = OrderEvents::default();
        let fulfillment = FulfillmentService::new(storage.clone(), events.clone());
        let gateway = Arc::new(HttpGateway::new(
            &config.gateway_base_url,
            &config.gateway_secret_key,
        ));
        let vault = Arc::new(HttpCardVault::new(
            &config.vault_base_url,
            &config.gateway_secret_key,
        ));
        let payments = PaymentCoordinator::new(
            storage.clone(),
            gateway,
            vault,
            fulfillment.clone(),
            events.clone(),
            &config.currency,
            &config.frontend_url,
        );
        let jwt = Arc::new(JwtService::new(&config.jwt_secret));

        Self {
            carts: CartService::new(storage.clone()),
            checkout: CheckoutService::new(storage.clone()),
            payments,
            fulfillment,
            events,
            jwt,
            shutdown: CancellationToken::new(),
            storage,
            config: Arc::new(config),
        }
    }

    /// Start the payment-timeout sweeper.
    pub fn spawn_background_tasks(&self) {
        let sweeper = PaymentTimeoutSweeper::new(
            self.storage.clone(),
            self.fulfillment.clone(),
            Duration::from_secs(self.config.payment_timeout_secs),
            Duration::from_secs(self.config.sweep_interval_secs),
            self.shutdown.clone(),
        );
        tokio::spawn(sweeper.run());
    }
}
