//! Authentication Handlers
//!
//! Customers sign in by mobile number alone; admins also need a password.

use std::time::Duration;

use axum::{Json, extract::State};
use shared::models::{Admin, AdminLoginRequest, LoginRequest, User, UserCreate};

use crate::core::ServerState;
use crate::utils::AppResult;

/// Fixed delay before answering a failed admin login
const AUTH_FIXED_DELAY_MS: u64 = 500;

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<ServerState>,
    Json(payload): Json<UserCreate>,
) -> AppResult<Json<User>> {
    let user = state.users.create(payload)?;
    tracing::info!(user_id = user.id, "User signed up");
    Ok(Json(user))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<User>> {
    match state.users.login(req.mobile.trim()) {
        Ok(user) => Ok(Json(user)),
        Err(e) => {
            tracing::warn!(mobile = %req.mobile, "Login failed");
            Err(e.into())
        }
    }
}

/// POST /api/auth/admin/login
pub async fn admin_login(
    State(state): State<ServerState>,
    Json(req): Json<AdminLoginRequest>,
) -> AppResult<Json<Admin>> {
    match state.admins.login(req.mobile.trim(), &req.password) {
        Ok(admin) => {
            tracing::info!(admin_id = admin.id, "Admin logged in");
            Ok(Json(admin))
        }
        Err(e) => {
            tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;
            tracing::warn!(mobile = %req.mobile, "Admin login failed");
            Err(e.into())
        }
    }
}
