//! Product API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{Product, ProductCreate};

use crate::core::ServerState;
use crate::utils::{AppError, AppResult, ErrorCode};

/// GET /api/products - 菜单 (按分类、名称排序)
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Product>>> {
    Ok(Json(state.products.find_all()?))
}

/// GET /api/products/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Product>> {
    let product = state
        .products
        .find_by_id(id)?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound).with_detail("product_id", id))?;
    Ok(Json(product))
}

/// POST /api/products - 新增菜品
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ProductCreate>,
) -> AppResult<Json<Product>> {
    let product = state.products.create(payload)?;
    tracing::info!(product_id = product.id, name = %product.name, "Product created");
    Ok(Json(product))
}

/// DELETE /api/products/:id - 删除菜品
///
/// 已有订单和购物车中的条目保留，展示时使用占位名称。
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    if !state.products.delete(id)? {
        return Err(AppError::new(ErrorCode::ProductNotFound).with_detail("product_id", id));
    }
    tracing::info!(product_id = id, "Product deleted");
    Ok(Json(true))
}
