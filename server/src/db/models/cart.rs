//! Cart Model

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

/// Cart record — one per customer, created lazily
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// Customer reference ("user:xxx")
    pub customer: String,
    #[serde(default)]
    pub items: Vec<CartEntry>,
    pub created_at: i64,
}

/// One stored cart line: product reference plus desired quantity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartEntry {
    /// Product reference ("product:xxx")
    pub product: String,
    pub quantity: i64,
}
