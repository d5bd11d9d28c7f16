//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::models::{Order, OrderEditOutcome, OrderItemsUpdate, OrderQuery, OrderStatus, OrderView};

use crate::core::ServerState;
use crate::services::render_orders;
use crate::utils::AppResult;

/// GET /api/orders?status=Pending|Completed - 管理端订单视图
///
/// 默认返回待处理订单；两种状态都按下单时间从早到晚排列。
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<OrderQuery>,
) -> AppResult<Json<Vec<OrderView>>> {
    let status = query.status.unwrap_or(OrderStatus::Pending);
    let orders = state.orders.list_by_status(status)?;
    Ok(Json(render_orders(orders, &state.users, &state.products)?))
}

/// GET /api/orders/user/:user_id - 我的订单 (最新在前)
pub async fn list_for_user(
    State(state): State<ServerState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<OrderView>>> {
    let orders = state.orders.list_for_user(user_id)?;
    Ok(Json(render_orders(orders, &state.users, &state.products)?))
}

/// PUT /api/orders/:id/items - 顾客修改待处理订单
pub async fn update_items(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<OrderItemsUpdate>,
) -> AppResult<Json<OrderEditOutcome>> {
    let outcome = state.orders.update_items(id, &payload.items)?;
    if let OrderEditOutcome::Deleted { order_id } = &outcome {
        tracing::info!(order_id, "Order removed after all quantities were cleared");
    }
    Ok(Json(outcome))
}

/// POST /api/orders/:id/complete - 完成订单 (不影响托盘)
pub async fn complete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    let order = state.orders.complete(id)?;
    tracing::info!(order_id = id, table = order.table_number, "Order completed");
    Ok(Json(order))
}
