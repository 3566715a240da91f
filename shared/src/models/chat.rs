//! Conversation and Message Models

use serde::{Deserialize, Serialize};

use crate::models::Role;

/// Conversation lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatStatus {
    Open,
    Pending,
    Closed,
}

/// Per-party unread counters
///
/// A message bumps the counter of the *other* party; reading resets
/// one's own counter.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UnreadCount {
    pub customer: i64,
    pub admin: i64,
}

/// Conversation summary — one per customer, ordered by
/// `last_message_at` descending in list views
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub customer: String,
    /// Admin who claimed the conversation; None until claimed
    pub assigned_agent: Option<String>,
    pub status: ChatStatus,
    /// Denormalized text of the most recent message
    pub last_message: Option<String>,
    /// UTC millis of the most recent message
    pub last_message_at: Option<i64>,
    pub unread: UnreadCount,
    pub created_at: i64,
}

/// Chat message. Immutable once created; ordered by `created_at`
/// ascending within a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub conversation: String,
    pub sender: String,
    pub sender_role: Role,
    pub body: String,
    /// Client-generated tag for optimistic-echo reconciliation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_tag: Option<String>,
    pub created_at: i64,
}
