//! User API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::User;

use crate::core::ServerState;
use crate::utils::AppResult;

/// GET /api/users - 获取所有用户
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.users.find_all()?))
}

/// POST /api/users/:id/toggle - 启用 / 禁用用户
pub async fn toggle(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<User>> {
    let user = state.users.toggle_enabled(id)?;
    tracing::info!(user_id = id, enabled = user.enabled, "User enabled flag toggled");
    Ok(Json(user))
}
