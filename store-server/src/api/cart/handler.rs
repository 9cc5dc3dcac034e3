//! Cart API handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::ApiResponse;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::checkout::CartView;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult, ok};

#[derive(Debug, Deserialize, Validate)]
pub struct AddItemRequest {
    #[validate(length(min = 1))]
    pub product_id: String,
    #[validate(range(min = 1))]
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: u32,
}

pub async fn view(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let cart = state.carts.view(&user.id).map_err(AppError::from)?;
    Ok(ok(cart))
}

pub async fn add_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<AddItemRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    state
        .carts
        .add_item(&user.id, &payload.product_id, payload.quantity)?;
    Ok(ok(state.carts.view(&user.id)?))
}

pub async fn set_quantity(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(product_id): Path<String>,
    Json(payload): Json<SetQuantityRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    state
        .carts
        .set_quantity(&user.id, &product_id, payload.quantity)?;
    Ok(ok(state.carts.view(&user.id)?))
}

pub async fn clear(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<CartView>>> {
    state.carts.clear(&user.id)?;
    Ok(ok(state.carts.view(&user.id)?))
}

pub async fn remove_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(product_id): Path<String>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    state.carts.remove_item(&user.id, &product_id)?;
    Ok(ok(state.carts.view(&user.id)?))
}
