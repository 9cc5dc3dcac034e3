//! Hosted-checkout gateway client
//!
//! REST integration without an SDK dependency. Session creation and
//! status fetches are plain HTTPS calls; callers must never hold a
//! write transaction across them.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use shared::Order;
use tracing::warn;

/// Hosted session handed back to the client for redirection
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub session_id: String,
    pub redirect_url: String,
}

/// Gateway-side view of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Client has not completed the hosted flow
    Open,
    Paid,
    Expired,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("gateway rejected request: {0}")]
    Rejected(String),
    #[error("unknown session: {0}")]
    UnknownSession(String),
}

/// External payment provider seam. The HTTP implementation talks to the
/// real provider; tests substitute scripted doubles.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a hosted checkout session for the order total.
    async fn create_checkout_session(
        &self,
        order: &Order,
        currency: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, GatewayError>;

    /// Fetch the provider's current view of a session.
    async fn fetch_session_status(&self, session_id: &str) -> Result<SessionStatus, GatewayError>;
}

pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            secret_key: secret_key.into(),
        }
    }
}

/// Providers bill in minor units (cents); amounts are rounded to two
/// decimal places before scaling.
fn to_minor_units(amount: Decimal) -> Option<i64> {
    (amount.round_dp(2) * Decimal::from(100)).to_i64()
}

#[async_trait]
impl PaymentGateway for HttpGateway {
    async fn create_checkout_session(
        &self,
        order: &Order,
        currency: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, GatewayError> {
        let amount = to_minor_units(order.total_amount)
            .ok_or_else(|| GatewayError::Rejected(format!("bad amount {}", order.total_amount)))?;

        let resp: serde_json::Value = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[
                ("amount", amount.to_string().as_str()),
                ("currency", currency),
                ("reference", order.id.as_str()),
                ("success_url", success_url),
                ("cancel_url", cancel_url),
            ])
            .send()
            .await?
            .json()
            .await?;

        match (resp["id"].as_str(), resp["url"].as_str()) {
            (Some(id), Some(url)) => Ok(CheckoutSession {
                session_id: id.to_string(),
                redirect_url: url.to_string(),
            }),
            _ => {
                warn!(order_id = %order.id, response = %resp, "session create rejected");
                Err(GatewayError::Rejected(resp.to_string()))
            }
        }
    }

    async fn fetch_session_status(&self, session_id: &str) -> Result<SessionStatus, GatewayError> {
        let resp = self
            .client
            .get(format!("{}/v1/checkout/sessions/{session_id}", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(GatewayError::UnknownSession(session_id.to_string()));
        }
        let body: serde_json::Value = resp.json().await?;
        match body["payment_status"].as_str() {
            Some("paid") => Ok(SessionStatus::Paid),
            Some("expired") => Ok(SessionStatus::Expired),
            Some(_) => Ok(SessionStatus::Open),
            None => Err(GatewayError::Rejected(body.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_minor_units_rounding() {
        assert_eq!(to_minor_units(d("12.34")), Some(1234));
        assert_eq!(to_minor_units(d("12.345")), Some(1234));
        assert_eq!(to_minor_units(d("0.005")), Some(0));
        assert_eq!(to_minor_units(d("100")), Some(10000));
    }
}
