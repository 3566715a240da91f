//! User Model

use serde::{Deserialize, Serialize};
use shared::models::{Role, UserInfo};
use surrealdb::RecordId;

use super::serde_helpers;

/// User record. `hash_pass` never leaves the server; handlers convert
/// to [`UserInfo`] before responding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub username: String,
    pub hash_pass: String,
    pub full_name: String,
    pub role: Role,
    #[serde(default = "default_true", deserialize_with = "serde_helpers::bool_true")]
    pub is_active: bool,
    pub created_at: i64,
}

fn default_true() -> bool {
    true
}

impl User {
    /// Public view without the password hash
    pub fn to_info(&self) -> UserInfo {
        UserInfo {
            id: super::id_string(&self.id),
            username: self.username.clone(),
            full_name: self.full_name.clone(),
            role: self.role,
        }
    }
}

/// Creation payload (plaintext password, hashed by the repository)
#[derive(Debug, Clone)]
pub struct UserCreate {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
}
