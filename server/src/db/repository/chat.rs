//! Chat Repository
//!
//! 会话与消息的持久化：
//! - 每个客户至多一个会话 (get-or-create)
//! - 消息按 `created_at` 升序读取
//! - 未读计数：新消息累加对方一侧，读取时清零自己一侧

use super::{BaseRepository, RepoError, RepoResult, parse_id};
use crate::db::models::{ChatMessage, Conversation};
use shared::models::{ChatStatus, Role, UnreadCount};
use shared::util::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

#[derive(Clone)]
pub struct ChatRepository {
    base: BaseRepository,
}

impl ChatRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find conversation by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Conversation>> {
        let thing = parse_id(id)?;
        let conversation: Option<Conversation> = self.base.db().select(thing).await?;
        Ok(conversation)
    }

    /// Find a customer's conversation
    pub async fn find_by_customer(&self, customer_id: &str) -> RepoResult<Option<Conversation>> {
        let customer_owned = customer_id.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM conversation WHERE customer = $customer LIMIT 1")
            .bind(("customer", customer_owned))
            .await?;
        let conversations: Vec<Conversation> = result.take(0)?;
        Ok(conversations.into_iter().next())
    }

    /// Get the customer's conversation, creating it on first contact
    pub async fn get_or_create(&self, customer_id: &str) -> RepoResult<Conversation> {
        if let Some(existing) = self.find_by_customer(customer_id).await? {
            return Ok(existing);
        }

        let conversation = Conversation {
            id: None,
            customer: customer_id.to_string(),
            assigned_agent: None,
            status: ChatStatus::Open,
            last_message: None,
            last_message_at: None,
            unread: UnreadCount::default(),
            created_at: now_millis(),
        };

        let created: Option<Conversation> = self
            .base
            .db()
            .create("conversation")
            .content(conversation)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create conversation".to_string()))
    }

    /// All conversations for the admin dashboard, most recent activity first
    pub async fn find_all(&self, status: Option<ChatStatus>) -> RepoResult<Vec<Conversation>> {
        let conversations: Vec<Conversation> = match status {
            Some(status) => {
                self.base
                    .db()
                    .query(
                        "SELECT * FROM conversation WHERE status = $status \
                         ORDER BY last_message_at DESC",
                    )
                    .bind(("status", status))
                    .await?
                    .take(0)?
            }
            None => {
                self.base
                    .db()
                    .query("SELECT * FROM conversation ORDER BY last_message_at DESC")
                    .await?
                    .take(0)?
            }
        };
        Ok(conversations)
    }

    /// Claim a conversation for an agent. First claim wins; a second
    /// claim is a no-op and the stored agent is returned unchanged.
    pub async fn assign_if_unset(&self, id: &str, agent_id: &str) -> RepoResult<Conversation> {
        let thing = parse_id(id)?;
        let agent_owned = agent_id.to_string();
        self.base
            .db()
            .query("UPDATE $thing SET assigned_agent = $agent WHERE assigned_agent = NONE")
            .bind(("thing", thing))
            .bind(("agent", agent_owned))
            .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Conversation {} not found", id)))
    }

    /// Set the conversation status
    pub async fn set_status(&self, id: &str, status: ChatStatus) -> RepoResult<Conversation> {
        let thing = parse_id(id)?;
        let mut result = self
            .base
            .db()
            .query("UPDATE $thing SET status = $status RETURN AFTER")
            .bind(("thing", thing))
            .bind(("status", status))
            .await?;
        let updated: Vec<Conversation> = result.take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Conversation {} not found", id)))
    }

    /// Persist one message
    pub async fn append_message(&self, message: ChatMessage) -> RepoResult<ChatMessage> {
        let created: Option<ChatMessage> =
            self.base.db().create("message").content(message).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create message".to_string()))
    }

    /// Update the conversation summary after a new message: denormalized
    /// last_message fields plus the unread counter of the *other* party.
    pub async fn record_incoming(
        &self,
        id: &str,
        body: &str,
        at: i64,
        sender_role: Role,
    ) -> RepoResult<Conversation> {
        let thing = parse_id(id)?;
        let body_owned = body.to_string();

        let query = match sender_role {
            Role::Customer => {
                "UPDATE $thing SET last_message = $body, last_message_at = $at, \
                 unread.admin += 1 RETURN AFTER"
            }
            Role::Admin => {
                "UPDATE $thing SET last_message = $body, last_message_at = $at, \
                 unread.customer += 1 RETURN AFTER"
            }
        };

        let mut result = self
            .base
            .db()
            .query(query)
            .bind(("thing", thing))
            .bind(("body", body_owned))
            .bind(("at", at))
            .await?;
        let updated: Vec<Conversation> = result.take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Conversation {} not found", id)))
    }

    /// Reset the reader's own unread counter. Returns the post-reset
    /// record so callers respond with the fresh counter, not a stale one.
    pub async fn reset_unread(&self, id: &str, reader_role: Role) -> RepoResult<Conversation> {
        let thing = parse_id(id)?;
        let query = match reader_role {
            Role::Customer => "UPDATE $thing SET unread.customer = 0 RETURN AFTER",
            Role::Admin => "UPDATE $thing SET unread.admin = 0 RETURN AFTER",
        };
        let mut result = self.base.db().query(query).bind(("thing", thing)).await?;
        let updated: Vec<Conversation> = result.take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Conversation {} not found", id)))
    }

    /// Messages of a conversation, oldest first
    pub async fn messages(
        &self,
        conversation_id: &str,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<ChatMessage>> {
        let conversation_owned = conversation_id.to_string();
        let messages: Vec<ChatMessage> = self
            .base
            .db()
            .query(
                "SELECT * FROM message WHERE conversation = $conversation \
                 ORDER BY created_at ASC LIMIT $limit START $offset",
            )
            .bind(("conversation", conversation_owned))
            .bind(("limit", limit))
            .bind(("offset", offset))
            .await?
            .take(0)?;
        Ok(messages)
    }
}
