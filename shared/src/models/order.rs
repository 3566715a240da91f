//! Order Model
//!
//! 订单状态机：
//!
//! ```text
//! pending -> confirmed -> preparing -> out_for_delivery -> delivered
//!    │           │
//!    └───────────┴──> cancelled
//! ```
//!
//! `delivered` 和 `cancelled` 是终态，任何后续状态变更都会被拒绝。

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order status state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Terminal states accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// A customer may self-cancel only before preparation starts
    pub fn customer_can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// One order line. Price is snapshotted at order time so historical
/// orders stay stable against later price changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub product: String,
    pub product_name: String,
    pub quantity: i64,
    /// Unit price in cents at order time
    pub unit_price: i64,
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub customer: String,
    pub items: Vec<OrderItem>,
    /// Server-computed sum of quantity * unit_price, in cents
    pub total_amount: i64,
    pub status: OrderStatus,
    pub delivery_address: String,
    /// Creation timestamp (UTC millis)
    pub created_at: i64,
}

/// One entry of a stock rejection: which product fell short and by how much
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockIssue {
    pub product: String,
    pub requested: i64,
    pub available: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::OutForDelivery.is_terminal());
    }

    #[test]
    fn test_customer_cancel_window() {
        assert!(OrderStatus::Pending.customer_can_cancel());
        assert!(OrderStatus::Confirmed.customer_can_cancel());
        assert!(!OrderStatus::Preparing.customer_can_cancel());
        assert!(!OrderStatus::OutForDelivery.customer_can_cancel());
        assert!(!OrderStatus::Delivered.customer_can_cancel());
        assert!(!OrderStatus::Cancelled.customer_can_cancel());
    }

    #[test]
    fn test_status_serde_snake_case() {
        let json = serde_json::to_string(&OrderStatus::OutForDelivery).unwrap();
        assert_eq!(json, "\"out_for_delivery\"");
        let back: OrderStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(back, OrderStatus::Cancelled);
    }
}
