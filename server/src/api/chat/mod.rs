//! Chat API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::middleware::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/chat", routes())
}

fn routes() -> Router<ServerState> {
    let admin = Router::new()
        .route("/conversations", get(handler::list_conversations))
        .route("/conversations/{id}", get(handler::get_conversation))
        .route("/conversations/{id}/assign", post(handler::assign))
        .route("/conversations/{id}/status", put(handler::set_status))
        .route_layer(middleware::from_fn(require_admin));

    Router::new()
        // 客户视角：自己的会话 (首次访问自动创建)
        .route("/", get(handler::my_chat))
        .merge(admin)
}
