//! Category Model

use serde::{Deserialize, Serialize};

/// Product category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub sort_order: i32,
    pub is_active: bool,
}
