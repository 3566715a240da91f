//! Order API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::middleware::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    let admin = Router::new()
        .route("/", get(handler::list_all))
        .route("/{id}/status", put(handler::set_status))
        .route_layer(middleware::from_fn(require_admin));

    Router::new()
        .route("/", post(handler::create))
        .route("/mine", get(handler::list_mine))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/cancel", post(handler::cancel))
        .merge(admin)
}
