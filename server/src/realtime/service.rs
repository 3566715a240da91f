//! Chat Relay Service
//!
//! 先持久化、后广播。同一会话的发送走同一把锁，广播顺序即
//! 持久化顺序。存储操作全部套超时，慢盘只会拖慢发送方，
//! 不会挂起整个网关。

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use shared::models::Role;
use shared::realtime::{ClientEvent, ServerEvent};
use shared::util::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::db::models::ChatMessage as ChatMessageRecord;
use crate::db::models::Conversation as ConversationRecord;
use crate::db::repository::{ChatRepository, RepoResult};

use super::registry::{ConnectionId, ConnectionRegistry};
use super::rooms::{Actor, RoomId, message_fanout};

/// Chat relay — the server side of the realtime protocol
pub struct ChatRelay {
    chats: ChatRepository,
    registry: Arc<ConnectionRegistry>,
    store_timeout: Duration,
    /// Per-conversation send locks; broadcast order == persistence order
    send_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ChatRelay {
    pub fn new(db: Surreal<Db>, registry: Arc<ConnectionRegistry>, store_timeout: Duration) -> Self {
        Self {
            chats: ChatRepository::new(db),
            registry,
            store_timeout,
            send_locks: DashMap::new(),
        }
    }

    /// Entry point for every inbound client event
    pub async fn handle_event(&self, conn_id: ConnectionId, actor: &Actor, event: ClientEvent) {
        match event {
            ClientEvent::JoinChat { conversation_id } => {
                self.handle_join(conn_id, actor, &conversation_id).await;
            }
            ClientEvent::SendMessage {
                conversation_id,
                body,
                client_tag,
            } => {
                self.handle_send(conn_id, actor, &conversation_id, &body, client_tag)
                    .await;
            }
            ClientEvent::Typing {
                conversation_id,
                is_typing,
            } => {
                self.handle_typing(conn_id, actor, &conversation_id, is_typing);
            }
        }
    }

    /// Conversations currently holding a send lock entry
    pub fn active_send_locks(&self) -> usize {
        self.send_locks.len()
    }

    /// REST 接口 (指派/状态变更) 复用的会话广播
    pub fn broadcast_conversation(&self, conversation: &shared::models::Conversation) {
        let event = ServerEvent::ConversationUpdated {
            conversation: conversation.clone(),
        };
        self.registry
            .broadcast(&RoomId::Chat(conversation.id.clone()), &event);
        self.registry.broadcast(&RoomId::Admins, &event);
    }

    async fn handle_join(&self, conn_id: ConnectionId, actor: &Actor, conversation_id: &str) {
        if self
            .load_authorized(conn_id, actor, conversation_id)
            .await
            .is_none()
        {
            return;
        }

        self.registry
            .join(conn_id, RoomId::Chat(conversation_id.to_string()));
        debug!(conversation = %conversation_id, actor = %actor.id(), "Joined chat room");

        // Entering the room counts as reading it
        if let Err(e) = self
            .timed(self.chats.reset_unread(conversation_id, actor.role()))
            .await
        {
            warn!(conversation = %conversation_id, error = %e, "Failed to reset unread counter");
        }
    }

    async fn handle_send(
        &self,
        conn_id: ConnectionId,
        actor: &Actor,
        conversation_id: &str,
        body: &str,
        client_tag: Option<String>,
    ) {
        let body = body.trim();
        if body.is_empty() {
            self.registry
                .send_to(conn_id, ServerEvent::error("Message body cannot be empty"));
            return;
        }

        if self
            .load_authorized(conn_id, actor, conversation_id)
            .await
            .is_none()
        {
            return;
        }

        // Linearize sends within the conversation
        let lock = self
            .send_locks
            .entry(conversation_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock().await;
        self.persist_and_broadcast(conn_id, actor, conversation_id, body, client_tag)
            .await;
        drop(guard);

        // Evict the lock entry once nobody else is waiting on it, so the
        // table does not grow with every conversation ever messaged.
        // Map entry + our clone are the only references when idle.
        self.send_locks
            .remove_if(conversation_id, |_, l| Arc::strong_count(l) == 2);
    }

    async fn persist_and_broadcast(
        &self,
        conn_id: ConnectionId,
        actor: &Actor,
        conversation_id: &str,
        body: &str,
        client_tag: Option<String>,
    ) {
        let record = ChatMessageRecord {
            id: None,
            conversation: conversation_id.to_string(),
            sender: actor.id().to_string(),
            sender_role: actor.role(),
            body: body.to_string(),
            client_tag,
            created_at: now_millis(),
        };

        let message = match self.timed(self.chats.append_message(record)).await {
            Ok(m) => m,
            Err(e) => {
                self.registry.send_to(conn_id, ServerEvent::error(e));
                return;
            }
        };

        let conversation = match self
            .timed(self.chats.record_incoming(
                conversation_id,
                &message.body,
                message.created_at,
                message.sender_role,
            ))
            .await
        {
            Ok(c) => c,
            Err(e) => {
                // Message is durable; summary update failed. Broadcast
                // anyway so live members still see the message.
                warn!(conversation = %conversation_id, error = %e, "Failed to update conversation summary");
                match self.timed(self.chats.find_by_id(conversation_id)).await {
                    Ok(Some(c)) => c,
                    _ => {
                        self.registry.send_to(conn_id, ServerEvent::error(e));
                        return;
                    }
                }
            }
        };

        let wire_message = message.to_wire();
        let wire_conversation = conversation.to_wire();
        for (room, event) in message_fanout(&wire_message, &wire_conversation) {
            self.registry.broadcast(&room, &event);
        }
    }

    fn handle_typing(
        &self,
        conn_id: ConnectionId,
        actor: &Actor,
        conversation_id: &str,
        is_typing: bool,
    ) {
        let room = RoomId::Chat(conversation_id.to_string());

        // Typing is only relayed inside rooms the sender actually joined
        if !self.registry.is_member(conn_id, &room) {
            return;
        }

        self.registry.broadcast_except(
            &room,
            conn_id,
            &ServerEvent::UserTyping {
                identity_id: actor.id().to_string(),
                is_typing,
            },
        );
    }

    /// Load a conversation and check the actor may touch it.
    /// Sends an error event to the connection and returns None on failure.
    async fn load_authorized(
        &self,
        conn_id: ConnectionId,
        actor: &Actor,
        conversation_id: &str,
    ) -> Option<ConversationRecord> {
        let conversation = match self.timed(self.chats.find_by_id(conversation_id)).await {
            Ok(Some(c)) => c,
            Ok(None) => {
                self.registry
                    .send_to(conn_id, ServerEvent::error("Conversation not found"));
                return None;
            }
            Err(e) => {
                self.registry.send_to(conn_id, ServerEvent::error(e));
                return None;
            }
        };

        // Customers may only touch their own conversation
        if actor.role() == Role::Customer && conversation.customer != actor.id() {
            self.registry
                .send_to(conn_id, ServerEvent::error("Access denied"));
            return None;
        }

        Some(conversation)
    }

    /// Wrap a store operation in the configured timeout
    async fn timed<T, F>(&self, fut: F) -> Result<T, String>
    where
        F: Future<Output = RepoResult<T>>,
    {
        match tokio::time::timeout(self.store_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(format!("Store error: {}", e)),
            Err(_) => {
                warn!(timeout_ms = self.store_timeout.as_millis() as u64, "Store operation timed out");
                Err("Temporary failure, please retry".to_string())
            }
        }
    }
}
