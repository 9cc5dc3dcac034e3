//! Payment verification handlers
//!
//! Neither endpoint trusts its input: the session id is only a lookup
//! key, and the payment state comes from a fresh provider query inside
//! `verify_session`. A forged call can at worst trigger an extra
//! status fetch.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use shared::{ApiResponse, PaymentHandle};
use tracing::info;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult, ok};

#[derive(Debug, Deserialize)]
pub struct ReturnQuery {
    pub order_id: String,
    /// Present for gateway flows only
    pub session_id: Option<String>,
}

/// Client lands here after the hosted checkout flow. Without a session
/// id (non-gateway methods) this just reports the current payment.
pub async fn payment_return(
    State(state): State<ServerState>,
    user: Option<CurrentUser>,
    Query(query): Query<ReturnQuery>,
) -> AppResult<Json<ApiResponse<PaymentHandle>>> {
    info!(order_id = %query.order_id, session_id = ?query.session_id, "payment return");
    let handle = match &query.session_id {
        Some(session_id) => state.payments.verify_session(session_id).await?,
        // order ids leak through cancel URLs and logs, so the
        // session-less branch needs the owner's token instead
        None => {
            let user = user.ok_or(AppError::Unauthorized)?;
            let payment = state.payments.payment_for_order(&user.id, &query.order_id)?;
            PaymentHandle::from_payment(&payment)
        }
    };
    Ok(ok(handle))
}

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub session_id: String,
}

/// Provider-side notification; resolves sessions for clients that
/// closed the tab before the redirect.
pub async fn webhook(
    State(state): State<ServerState>,
    Json(event): Json<WebhookEvent>,
) -> AppResult<Json<ApiResponse<PaymentHandle>>> {
    info!(event_type = %event.event_type, session_id = %event.session_id, "gateway webhook");
    let handle = state.payments.verify_session(&event.session_id).await?;
    Ok(ok(handle))
}
