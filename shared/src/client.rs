//! Request/response DTOs shared between server handlers and clients

use serde::{Deserialize, Serialize};

use crate::models::{CartItem, ChatMessage, Conversation, Order, OrderStatus, UserInfo};

// ==================== Auth ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

// ==================== Orders ====================

/// One submitted order line; price is looked up server-side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub product: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemRequest>,
    pub delivery_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusRequest {
    pub status: OrderStatus,
}

/// Paginated admin order listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderListResponse {
    pub orders: Vec<Order>,
    pub total: i64,
}

// ==================== Cart ====================

fn default_cart_quantity() -> i64 {
    1
}

/// One cart mutation; `quantity` defaults to 1 when omitted on add
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemRequest {
    pub product: String,
    #[serde(default = "default_cart_quantity")]
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartResponse {
    pub items: Vec<CartItem>,
}

// ==================== Chat ====================

/// Customer view: own conversation plus recent history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub conversation: Option<Conversation>,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatStatusRequest {
    pub status: crate::models::ChatStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatListResponse {
    pub conversations: Vec<Conversation>,
    pub total: i64,
}
