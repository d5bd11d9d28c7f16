//! Order API 模块

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/user/{user_id}", get(handler::list_for_user))
        .route("/{id}/items", put(handler::update_items))
        .route("/{id}/complete", post(handler::complete))
}
