//! Product Model

use serde::{Deserialize, Serialize};

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Category reference (String ID)
    pub category: Option<String>,
    /// Price in cents
    pub price: i64,
    /// Remaining purchasable units, never negative
    pub stock: i64,
    pub is_active: bool,
}
