//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::OrderRepository;
use crate::orders::OrderLifecycle;
use crate::utils::{AppError, AppResult};
use shared::client::{CreateOrderRequest, OrderListResponse, OrderStatusRequest};
use shared::models::{Order, OrderStatus};

/// POST /api/orders - 客户下单
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<Order>> {
    if payload.delivery_address.trim().is_empty() {
        return Err(AppError::validation("Delivery address cannot be empty"));
    }

    let lifecycle = OrderLifecycle::new(state.get_db());
    let order = lifecycle.create_order(&user.id, payload).await?;
    Ok(Json(order))
}

/// GET /api/orders/mine - 当前客户的订单, 最新在前
pub async fn list_mine(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<Order>>> {
    let repo = OrderRepository::new(state.get_db());
    let orders = repo.find_by_customer(&user.id).await?;
    Ok(Json(orders.iter().map(|o| o.to_wire()).collect()))
}

/// GET /api/orders/:id - 订单详情 (本人或管理员)
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let repo = OrderRepository::new(state.get_db());
    let order = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {} not found", id)))?;

    if !user.is_admin() && order.customer != user.id {
        return Err(AppError::forbidden("Order belongs to another customer"));
    }

    Ok(Json(order.to_wire()))
}

/// POST /api/orders/:id/cancel - 客户取消订单
pub async fn cancel(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let lifecycle = OrderLifecycle::new(state.get_db());
    let order = lifecycle.cancel_by_customer(&user.id, &id).await?;
    Ok(Json(order))
}

#[derive(Debug, Deserialize)]
pub struct ListAllQuery {
    status: Option<OrderStatus>,
    limit: Option<i64>,
    offset: Option<i64>,
}

/// GET /api/orders?status=&limit=&offset= - 订单列表 (管理员)
pub async fn list_all(
    State(state): State<ServerState>,
    Query(query): Query<ListAllQuery>,
) -> AppResult<Json<OrderListResponse>> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let repo = OrderRepository::new(state.get_db());
    let orders = repo.find_all(query.status, limit, offset).await?;
    let total = repo.count(query.status).await?;

    Ok(Json(OrderListResponse {
        orders: orders.iter().map(|o| o.to_wire()).collect(),
        total,
    }))
}

/// PUT /api/orders/:id/status - 状态流转 (管理员)
pub async fn set_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<OrderStatusRequest>,
) -> AppResult<Json<Order>> {
    let lifecycle = OrderLifecycle::new(state.get_db());
    let order = lifecycle.set_status_admin(&id, payload.status).await?;
    Ok(Json(order))
}
