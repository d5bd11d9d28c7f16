//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 注册、顾客登录、管理员登录
//! - [`users`] - 用户管理
//! - [`products`] - 菜品
//! - [`cart`] - 购物车与结账
//! - [`orders`] - 订单视图、编辑、完成
//! - [`trays`] - 托盘状态、手动编辑、SSE 同步会话
//! - [`robot`] - 机器人控制面板

pub mod auth;
pub mod cart;
pub mod health;
pub mod orders;
pub mod products;
pub mod robot;
pub mod trays;
pub mod users;

use axum::{Router, middleware};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;

use crate::core::ServerState;

pub use crate::utils::{AppError, AppResult};

/// HTTP 请求日志中间件
async fn log_request(
    request: http::Request<axum::body::Body>,
    next: middleware::Next,
) -> http::Response<axum::body::Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    tracing::info!(target: "http_access", "{} {} {}", method, uri, response.status());

    response
}

/// Build the Axum router (without state)
pub fn routes() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(users::router())
        .merge(products::router())
        .merge(cart::router())
        .merge(orders::router())
        .merge(trays::router())
        .merge(robot::router())
}

/// Full application with state and middleware
pub fn build_app(state: ServerState) -> Router {
    routes()
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(log_request))
}
