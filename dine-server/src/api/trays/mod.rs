//! Tray API 模块
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/trays | GET | 当前托盘状态 |
//! | /api/trays | PUT | 管理员手动编辑 |
//! | /api/trays/stream | GET | SSE，每个连接一个同步会话 |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/trays", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::get).put(handler::edit))
        .route("/stream", get(handler::stream))
}
