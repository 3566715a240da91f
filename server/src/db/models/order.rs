//! Order Model

use serde::{Deserialize, Serialize};
use shared::models::{OrderItem, OrderStatus};
use surrealdb::RecordId;

use super::serde_helpers;

/// Order record
///
/// `stock_restored` 防止取消订单时重复回补库存：回补只在该标志
/// 首次翻转时执行。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// Customer reference ("user:xxx")
    pub customer: String,
    pub items: Vec<OrderItem>,
    /// Sum of quantity * unit_price, in cents
    pub total_amount: i64,
    pub status: OrderStatus,
    pub delivery_address: String,
    pub created_at: i64,
    #[serde(default)]
    pub stock_restored: bool,
}

impl Order {
    pub fn to_wire(&self) -> shared::models::Order {
        shared::models::Order {
            id: super::id_string(&self.id),
            customer: self.customer.clone(),
            items: self.items.clone(),
            total_amount: self.total_amount,
            status: self.status,
            delivery_address: self.delivery_address.clone(),
            created_at: self.created_at,
        }
    }
}
