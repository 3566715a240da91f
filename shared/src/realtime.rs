//! Realtime wire events
//!
//! # 消息流
//!
//! ```text
//! Client ──▶ ClientEvent ──▶ Gateway ──▶ store write ──▶ fan-out
//!                                            │
//!                              ServerEvent ◀─┘ (rooms)
//! ```
//!
//! Events are JSON text frames over the WebSocket, tagged by `type`.
//! Broadcasts only fire after the underlying write committed; a failed
//! write surfaces as [`ServerEvent::Error`] to the sender only.

use serde::{Deserialize, Serialize};

use crate::models::{ChatMessage, Conversation};

/// 客户端 -> 服务端事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Enroll this connection in a conversation room (idempotent)
    JoinChat { conversation_id: String },

    /// Persist and relay a chat message
    ///
    /// `client_tag` is generated by the sender and echoed back in the
    /// broadcast so the optimistic local copy can be reconciled.
    SendMessage {
        conversation_id: String,
        body: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        client_tag: Option<String>,
    },

    /// Fire-and-forget typing indicator; never persisted
    Typing {
        conversation_id: String,
        is_typing: bool,
    },
}

/// 服务端 -> 客户端事件
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A message was durably recorded and is being fanned out
    NewMessage { message: ChatMessage },

    /// Conversation summary changed (new message, assignment, status)
    ConversationUpdated { conversation: Conversation },

    /// Another room member started or stopped typing
    UserTyping { identity_id: String, is_typing: bool },

    /// Operation failed; delivered to the originating connection only
    Error { message: String },
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_event_tagged_json() {
        let ev = ClientEvent::Typing {
            conversation_id: "chat:abc".into(),
            is_typing: true,
        };
        let json = serde_json::to_string(&ev).unwrap();
        assert!(json.contains("\"type\":\"typing\""));
        let back: ClientEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ev);
    }

    #[test]
    fn test_send_message_tag_optional() {
        let json = r#"{"type":"send_message","conversation_id":"chat:1","body":"hi"}"#;
        let ev: ClientEvent = serde_json::from_str(json).unwrap();
        match ev {
            ClientEvent::SendMessage { client_tag, .. } => assert!(client_tag.is_none()),
            _ => panic!("wrong variant"),
        }
    }
}
