//! Product API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::models::{ProductCreate, ProductUpdate};
use crate::db::repository::ProductRepository;
use crate::utils::{AppError, AppResult};
use shared::models::Product;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    category: Option<String>,
}

/// GET /api/products?category=... - 获取商品列表
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Product>>> {
    let repo = ProductRepository::new(state.get_db());
    let products = match query.category {
        Some(category) => repo.find_by_category(&category).await?,
        None => repo.find_all().await?,
    };
    Ok(Json(products.iter().map(|p| p.to_wire()).collect()))
}

/// GET /api/products/:id - 获取单个商品
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Product>> {
    let repo = ProductRepository::new(state.get_db());
    let product = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {} not found", id)))?;
    Ok(Json(product.to_wire()))
}

/// POST /api/products - 创建商品 (管理员)
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ProductCreate>,
) -> AppResult<Json<Product>> {
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Product name cannot be empty"));
    }

    let repo = ProductRepository::new(state.get_db());
    let product = repo.create(payload).await?;
    Ok(Json(product.to_wire()))
}

/// PUT /api/products/:id - 更新商品 (管理员)
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<Json<Product>> {
    let repo = ProductRepository::new(state.get_db());
    let product = repo.update(&id, payload).await?;
    Ok(Json(product.to_wire()))
}

/// DELETE /api/products/:id - 下架商品 (软删除, 管理员)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    let repo = ProductRepository::new(state.get_db());
    let result = repo.delete(&id).await?;
    Ok(Json(result))
}
