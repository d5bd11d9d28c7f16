//! Robot control panel handlers

use axum::{Json, extract::State};
use shared::models::{RobotStatus, RobotUpdate, ServedSignal, UltrasonicEdit, tray};

use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

/// GET /api/robot
pub async fn status(State(state): State<ServerState>) -> Json<RobotStatus> {
    Json(state.tree.read_robot_status())
}

/// PUT /api/robot - 设置标志位 / 电量
pub async fn update(
    State(state): State<ServerState>,
    Json(payload): Json<RobotUpdate>,
) -> AppResult<Json<RobotStatus>> {
    if payload.is_empty() {
        return Err(AppError::validation("No robot field to update"));
    }
    payload.validate()?;
    state.tree.write_robot_update(&payload);
    tracing::info!(update = ?payload, "Robot state updated");
    Ok(Json(state.tree.read_robot_status()))
}

/// POST /api/robot/served - 机器人 "托盘已清空" 信号
///
/// 信号已为 true (上次重排失败) 时先写 false 再写 true，保证会话能再次收到变化。
pub async fn served(
    State(state): State<ServerState>,
    Json(payload): Json<ServedSignal>,
) -> Json<RobotStatus> {
    if payload.served {
        if state.tree.get(tray::paths::SERVED) == Some(serde_json::Value::Bool(true)) {
            state.tree.set(tray::paths::SERVED, false);
        }
        tracing::info!("Served signal raised");
    }
    state.tree.set(tray::paths::SERVED, payload.served);
    Json(state.tree.read_robot_status())
}

/// PUT /api/robot/ultrasonic
pub async fn ultrasonic(
    State(state): State<ServerState>,
    Json(payload): Json<UltrasonicEdit>,
) -> AppResult<Json<RobotStatus>> {
    let readings = payload.parse()?;
    state.tree.write_ultrasonic(readings);
    Ok(Json(state.tree.read_robot_status()))
}
