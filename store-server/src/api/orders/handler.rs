//! Order API handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::{ApiResponse, Order, OrderStatus, Payment, PaymentHandle, PaymentMethod, Role};

use crate::auth::CurrentUser;
use crate::checkout::Actor;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult, ok, ok_with_message};

fn actor_for(user: &CurrentUser) -> Actor {
    match user.role {
        Role::Client => Actor::Client(user.id.clone()),
        role => Actor::Staff {
            id: user.id.clone(),
            role,
        },
    }
}

/// Convert the caller's cart into a pending_payment order.
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state.checkout.create_order(&user.id)?;
    Ok(ok_with_message(order, "Order created, awaiting payment"))
}

/// The caller's orders, newest first.
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<Order>>>> {
    let orders = state
        .storage
        .list_orders_by_client(&user.id)
        .map_err(|e| AppError::Storage(e.to_string()))?;
    Ok(ok(orders))
}

pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state
        .storage
        .get_order(&id)
        .map_err(|e| AppError::Storage(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Order {id} not found")))?;
    if order.client_id != user.id && !user.is_staff() {
        return Err(AppError::Forbidden(
            "not allowed to view this order".to_string(),
        ));
    }
    Ok(ok(order))
}

pub async fn cancel(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state.fulfillment.cancel_order(&id, &actor_for(&user))?;
    Ok(ok_with_message(order, "Order cancelled"))
}

#[derive(Debug, Deserialize)]
pub struct AdvanceStatusRequest {
    pub status: OrderStatus,
}

/// Staff-only progression through shipped and delivered.
pub async fn advance_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<AdvanceStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state
        .fulfillment
        .advance_status(&id, &actor_for(&user), payload.status)?;
    Ok(ok(order))
}

#[derive(Debug, Deserialize)]
pub struct InitiatePaymentRequest {
    pub method: PaymentMethod,
    /// Vault token, required for the stored_card method
    pub card_token: Option<String>,
}

pub async fn initiate_payment(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<InitiatePaymentRequest>,
) -> AppResult<Json<ApiResponse<PaymentHandle>>> {
    let handle = state
        .payments
        .initiate_payment(&user.id, &id, payload.method, payload.card_token.as_deref())
        .await?;
    Ok(ok(handle))
}

pub async fn get_payment(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Payment>>> {
    let payment = state.payments.payment_for_order(&user.id, &id)?;
    Ok(ok(payment))
}
