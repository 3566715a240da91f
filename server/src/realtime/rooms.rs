//! Rooms and Fan-out Rules
//!
//! 纯函数描述"谁收到什么"，与连接管理解耦，便于单测。

use std::fmt;

use shared::models::{ChatMessage, Conversation, Role};
use shared::realtime::ServerEvent;

/// Broadcast room identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoomId {
    /// One conversation's live members
    Chat(String),
    /// All connections of one user
    User(String),
    /// Every connected admin
    Admins,
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomId::Chat(id) => write!(f, "chat_{}", id),
            RoomId::User(id) => write!(f, "user_{}", id),
            RoomId::Admins => write!(f, "admin_room"),
        }
    }
}

/// Authenticated connection identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Customer { id: String },
    Admin { id: String },
}

impl Actor {
    pub fn id(&self) -> &str {
        match self {
            Actor::Customer { id } | Actor::Admin { id } => id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Actor::Customer { .. } => Role::Customer,
            Actor::Admin { .. } => Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Actor::Admin { .. })
    }
}

/// Rooms a connection is enrolled in immediately after the handshake.
/// Conversation rooms are joined later via the `join_chat` event.
pub fn enrollment_rooms(actor: &Actor) -> Vec<RoomId> {
    match actor {
        Actor::Customer { id } => vec![RoomId::User(id.clone())],
        Actor::Admin { id } => vec![RoomId::User(id.clone()), RoomId::Admins],
    }
}

/// Fan-out plan for a freshly persisted message.
///
/// - 会话房间总是收到 `NewMessage`
/// - 客户消息额外通知管理员面板 (`ConversationUpdated` -> admin_room)
/// - 管理员消息额外投递到客户个人房间，覆盖未加入会话房间的客户端
pub fn message_fanout(
    message: &ChatMessage,
    conversation: &Conversation,
) -> Vec<(RoomId, ServerEvent)> {
    let mut plan = vec![(
        RoomId::Chat(conversation.id.clone()),
        ServerEvent::NewMessage {
            message: message.clone(),
        },
    )];

    match message.sender_role {
        Role::Customer => {
            plan.push((
                RoomId::Admins,
                ServerEvent::ConversationUpdated {
                    conversation: conversation.clone(),
                },
            ));
        }
        Role::Admin => {
            plan.push((
                RoomId::User(conversation.customer.clone()),
                ServerEvent::NewMessage {
                    message: message.clone(),
                },
            ));
        }
    }

    plan
}
