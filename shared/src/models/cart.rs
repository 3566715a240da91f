//! Cart Model

use serde::{Deserialize, Serialize};

use crate::models::Product;

/// One cart line with the resolved product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: i64,
}
