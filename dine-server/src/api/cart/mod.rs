//! Cart API 模块

mod handler;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/cart", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/{user_id}", get(handler::list).post(handler::add))
        .route("/{user_id}/checkout", post(handler::checkout))
        .route("/{user_id}/{product_id}", delete(handler::remove))
}
