//! Robot API 模块

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/robot", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::status).put(handler::update))
        .route("/served", post(handler::served))
        .route("/ultrasonic", put(handler::ultrasonic))
}
