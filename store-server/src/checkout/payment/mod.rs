//! Payment methods and orchestration
//!
//! - [`gateway`]: hosted-checkout provider client
//! - [`card`]: stored-card (tokenized) charges
//! - [`coordinator`]: ties providers to order state

pub mod card;
pub mod coordinator;
pub mod gateway;

pub use card::{CardVault, ChargeOutcome, HttpCardVault};
pub use coordinator::PaymentCoordinator;
pub use gateway::{CheckoutSession, GatewayError, HttpGateway, PaymentGateway, SessionStatus};
