//! Health Check API

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

/// GET /health - 存活探针
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "quickmart-server",
        "timestamp": shared::util::now_millis(),
    }))
}
