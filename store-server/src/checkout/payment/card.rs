//! Stored-card charges
//!
//! Cards are referenced by vault token only; no PAN data touches this
//! process. A charge is synchronous: the vault answers approved or
//! declined in the response.

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::warn;

use super::gateway::GatewayError;

/// Outcome of a synchronous charge attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeOutcome {
    /// Approved, with the vault's charge reference
    Approved(String),
    /// Declined by the issuer; the reason is display-safe
    Declined(String),
}

/// Tokenized-card charge seam.
#[async_trait]
pub trait CardVault: Send + Sync {
    async fn charge(
        &self,
        card_token: &str,
        amount: Decimal,
        currency: &str,
        reference: &str,
    ) -> Result<ChargeOutcome, GatewayError>;
}

pub struct HttpCardVault {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl HttpCardVault {
    pub fn new(base_url: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            secret_key: secret_key.into(),
        }
    }
}

#[async_trait]
impl CardVault for HttpCardVault {
    async fn charge(
        &self,
        card_token: &str,
        amount: Decimal,
        currency: &str,
        reference: &str,
    ) -> Result<ChargeOutcome, GatewayError> {
        let resp: serde_json::Value = self
            .client
            .post(format!("{}/v1/charges", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[
                ("card_token", card_token),
                ("amount", amount.round_dp(2).to_string().as_str()),
                ("currency", currency),
                ("reference", reference),
            ])
            .send()
            .await?
            .json()
            .await?;

        match resp["status"].as_str() {
            Some("approved") => {
                let charge_id = resp["id"].as_str().unwrap_or(reference).to_string();
                Ok(ChargeOutcome::Approved(charge_id))
            }
            Some("declined") => {
                let reason = resp["decline_reason"]
                    .as_str()
                    .unwrap_or("declined")
                    .to_string();
                Ok(ChargeOutcome::Declined(reason))
            }
            _ => {
                warn!(reference = %reference, response = %resp, "charge rejected");
                Err(GatewayError::Rejected(resp.to_string()))
            }
        }
    }
}
