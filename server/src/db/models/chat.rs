//! Conversation and Message Models

use serde::{Deserialize, Serialize};
use shared::models::{ChatStatus, Role, UnreadCount};
use surrealdb::RecordId;

use super::serde_helpers;

/// Conversation record — one per customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// Customer reference ("user:xxx")
    pub customer: String,
    #[serde(default)]
    pub assigned_agent: Option<String>,
    pub status: ChatStatus,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub last_message_at: Option<i64>,
    #[serde(default)]
    pub unread: UnreadCount,
    pub created_at: i64,
}

impl Conversation {
    pub fn to_wire(&self) -> shared::models::Conversation {
        shared::models::Conversation {
            id: super::id_string(&self.id),
            customer: self.customer.clone(),
            assigned_agent: self.assigned_agent.clone(),
            status: self.status,
            last_message: self.last_message.clone(),
            last_message_at: self.last_message_at,
            unread: self.unread,
            created_at: self.created_at,
        }
    }
}

/// Chat message record. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// Conversation reference ("conversation:xxx")
    pub conversation: String,
    /// Sender reference ("user:xxx")
    pub sender: String,
    pub sender_role: Role,
    pub body: String,
    #[serde(default)]
    pub client_tag: Option<String>,
    pub created_at: i64,
}

impl ChatMessage {
    pub fn to_wire(&self) -> shared::models::ChatMessage {
        shared::models::ChatMessage {
            id: super::id_string(&self.id),
            conversation: self.conversation.clone(),
            sender: self.sender.clone(),
            sender_role: self.sender_role,
            body: self.body.clone(),
            client_tag: self.client_tag.clone(),
            created_at: self.created_at,
        }
    }
}
