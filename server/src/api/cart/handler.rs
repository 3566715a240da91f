//! Cart API Handlers
//!
//! 购物车服务端持久化，跨设备一致。返回前解析商品详情，
//! 已消失的商品行直接从视图中剔除。

use axum::{
    Json,
    extract::{Path, State},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::Cart;
use crate::db::repository::{CartRepository, ProductRepository};
use crate::utils::AppResult;
use shared::client::{CartItemRequest, CartResponse};
use shared::models::CartItem;

async fn to_response(state: &ServerState, cart: Cart) -> AppResult<Json<CartResponse>> {
    let products = ProductRepository::new(state.get_db());
    let mut items = Vec::with_capacity(cart.items.len());
    for entry in &cart.items {
        if let Some(product) = products.find_by_id(&entry.product).await? {
            items.push(CartItem {
                product: product.to_wire(),
                quantity: entry.quantity,
            });
        }
    }
    Ok(Json(CartResponse { items }))
}

/// GET /api/cart - 当前购物车
pub async fn my_cart(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<CartResponse>> {
    let cart = CartRepository::new(state.get_db())
        .get_or_create(&user.id)
        .await?;
    to_response(&state, cart).await
}

/// POST /api/cart/add - 加购 (同商品数量累加)
pub async fn add_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CartItemRequest>,
) -> AppResult<Json<CartResponse>> {
    let cart = CartRepository::new(state.get_db())
        .add_item(&user.id, &payload.product, payload.quantity)
        .await?;
    to_response(&state, cart).await
}

/// PUT /api/cart/update - 改量 (数量为 0 即移除)
pub async fn update_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CartItemRequest>,
) -> AppResult<Json<CartResponse>> {
    let cart = CartRepository::new(state.get_db())
        .update_item(&user.id, &payload.product, payload.quantity)
        .await?;
    to_response(&state, cart).await
}

/// DELETE /api/cart/remove/:product_id - 移除一行
pub async fn remove_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(product_id): Path<String>,
) -> AppResult<Json<CartResponse>> {
    let cart = CartRepository::new(state.get_db())
        .remove_item(&user.id, &product_id)
        .await?;
    to_response(&state, cart).await
}

/// DELETE /api/cart/clear - 清空购物车
pub async fn clear(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<CartResponse>> {
    let cart = CartRepository::new(state.get_db()).clear(&user.id).await?;
    to_response(&state, cart).await
}
