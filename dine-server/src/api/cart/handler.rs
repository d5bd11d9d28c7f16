//! Cart API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{CartAdd, CartEntry, CartLine, CheckoutRequest, Order};

use crate::core::ServerState;
use crate::utils::{AppError, AppResult, ErrorCode};

/// GET /api/cart/:user_id - 购物车明细
pub async fn list(
    State(state): State<ServerState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<CartLine>>> {
    Ok(Json(state.checkout.cart_lines(user_id)?))
}

/// POST /api/cart/:user_id - 加入购物车 (累加数量)
pub async fn add(
    State(state): State<ServerState>,
    Path(user_id): Path<i64>,
    Json(payload): Json<CartAdd>,
) -> AppResult<Json<CartEntry>> {
    if state.products.find_by_id(payload.product_id)?.is_none() {
        return Err(AppError::new(ErrorCode::ProductNotFound)
            .with_detail("product_id", payload.product_id));
    }
    Ok(Json(state.carts.add(user_id, &payload)?))
}

/// DELETE /api/cart/:user_id/:product_id
pub async fn remove(
    State(state): State<ServerState>,
    Path((user_id, product_id)): Path<(i64, i64)>,
) -> AppResult<Json<bool>> {
    state.carts.remove(user_id, product_id)?;
    Ok(Json(true))
}

/// POST /api/cart/:user_id/checkout - 下单并补位托盘
pub async fn checkout(
    State(state): State<ServerState>,
    Path(user_id): Path<i64>,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<Order>> {
    let order = state
        .checkout
        .place_order(user_id, &payload.table_number)
        .await?;
    Ok(Json(order))
}
