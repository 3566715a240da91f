//! Database Models
//!
//! 数据库记录结构。`id` 使用 SurrealDB 的 RecordId，其余引用字段
//! 统一存 "table:id" 字符串，避免跨表 FETCH。

pub mod cart;
pub mod category;
pub mod chat;
pub mod order;
pub mod product;
pub mod serde_helpers;
pub mod user;

pub use cart::{Cart, CartEntry};
pub use category::{Category, CategoryCreate, CategoryUpdate};
pub use chat::{ChatMessage, Conversation};
pub use order::Order;
pub use product::{Product, ProductCreate, ProductUpdate};
pub use user::{User, UserCreate};

use surrealdb::RecordId;

/// Render an optional record id as the canonical "table:id" string
pub(crate) fn id_string(id: &Option<RecordId>) -> String {
    id.as_ref().map(|r| r.to_string()).unwrap_or_default()
}
