//! Product catalog handlers

use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use shared::{ApiResponse, ProductRecord, ProductUpsert};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult, ok};

pub async fn get_by_id(
    State(state): State<ServerState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<ProductRecord>>> {
    let product = state
        .storage
        .get_product(&id)
        .map_err(|e| AppError::Storage(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Product {id} not found")))?;
    Ok(ok(product))
}

/// Admin-only upsert. Replaces price, stock and availability wholesale;
/// the upstream catalog is the source of truth for all of them.
pub async fn upsert(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<ProductUpsert>,
) -> AppResult<Json<ApiResponse<ProductRecord>>> {
    if !user.is_admin() {
        return Err(AppError::Forbidden(
            "catalog writes require admin role".to_string(),
        ));
    }
    if payload.name.is_empty() {
        return Err(AppError::Validation("Product name is required".to_string()));
    }
    if payload.price < Decimal::ZERO {
        return Err(AppError::Validation(
            "Product price must not be negative".to_string(),
        ));
    }

    let product = ProductRecord {
        id,
        name: payload.name,
        price: payload.price,
        stock: payload.stock,
        available: payload.available,
    };

    let txn = state
        .storage
        .begin_write()
        .map_err(|e| AppError::Storage(e.to_string()))?;
    state
        .storage
        .put_product_txn(&txn, &product)
        .map_err(|e| AppError::Storage(e.to_string()))?;
    state
        .storage
        .commit(txn)
        .map_err(|e| AppError::Storage(e.to_string()))?;

    Ok(ok(product))
}
