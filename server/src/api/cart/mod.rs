//! Cart API 模块

mod handler;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/cart", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::my_cart))
        .route("/add", post(handler::add_item))
        .route("/update", put(handler::update_item))
        .route("/remove/{product_id}", delete(handler::remove_item))
        .route("/clear", delete(handler::clear))
}
