//! Chat API Handlers
//!
//! REST 侧负责历史读取与会话管理；消息的发送只走 WebSocket。
//! 指派与状态变更会通过中继广播 `conversation_updated`。

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::ChatRepository;
use crate::utils::{AppError, AppResult};
use shared::client::{ChatListResponse, ChatResponse, ChatStatusRequest};
use shared::models::{ChatStatus, Role};

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    limit: Option<i64>,
    offset: Option<i64>,
}

impl MessagesQuery {
    fn bounds(&self) -> (i64, i64) {
        (self.limit.unwrap_or(100).clamp(1, 500), self.offset.unwrap_or(0).max(0))
    }
}

/// GET /api/chat - 客户自己的会话与历史
///
/// 首次访问自动创建会话；读取会清零客户侧未读。
pub async fn my_chat(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<MessagesQuery>,
) -> AppResult<Json<ChatResponse>> {
    let repo = ChatRepository::new(state.get_db());
    let conversation_id = repo
        .get_or_create(&user.id)
        .await?
        .id
        .as_ref()
        .map(|r| r.to_string())
        .ok_or_else(|| AppError::internal("Conversation has no id"))?;

    let (limit, offset) = query.bounds();
    let messages = repo.messages(&conversation_id, limit, offset).await?;
    // Reading clears the counter; respond with the post-reset record
    let conversation = repo.reset_unread(&conversation_id, Role::Customer).await?;

    Ok(Json(ChatResponse {
        conversation: Some(conversation.to_wire()),
        messages: messages.iter().map(|m| m.to_wire()).collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    status: Option<ChatStatus>,
}

/// GET /api/chat/conversations?status= - 会话列表 (管理员)
pub async fn list_conversations(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ChatListResponse>> {
    let repo = ChatRepository::new(state.get_db());
    let conversations = repo.find_all(query.status).await?;
    let total = conversations.len() as i64;

    Ok(Json(ChatListResponse {
        conversations: conversations.iter().map(|c| c.to_wire()).collect(),
        total,
    }))
}

/// GET /api/chat/conversations/:id - 会话详情与历史 (管理员)
///
/// 读取会清零管理员侧未读。
pub async fn get_conversation(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Query(query): Query<MessagesQuery>,
) -> AppResult<Json<ChatResponse>> {
    let repo = ChatRepository::new(state.get_db());
    let (limit, offset) = query.bounds();
    let messages = repo.messages(&id, limit, offset).await?;
    // Reading clears the counter; respond with the post-reset record.
    // A missing conversation surfaces here as NotFound.
    let conversation = repo.reset_unread(&id, Role::Admin).await?;

    Ok(Json(ChatResponse {
        conversation: Some(conversation.to_wire()),
        messages: messages.iter().map(|m| m.to_wire()).collect(),
    }))
}

/// POST /api/chat/conversations/:id/assign - 认领会话 (管理员)
///
/// 先到先得：已被认领时不改写，返回当前持有者。
pub async fn assign(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<shared::models::Conversation>> {
    let repo = ChatRepository::new(state.get_db());
    let conversation = repo.assign_if_unset(&id, &user.id).await?;

    let wire = conversation.to_wire();
    state.relay.broadcast_conversation(&wire);

    Ok(Json(wire))
}

/// PUT /api/chat/conversations/:id/status - 会话状态变更 (管理员)
pub async fn set_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<ChatStatusRequest>,
) -> AppResult<Json<shared::models::Conversation>> {
    let repo = ChatRepository::new(state.get_db());
    let conversation = repo.set_status(&id, payload.status).await?;

    let wire = conversation.to_wire();
    state.relay.broadcast_conversation(&wire);

    Ok(Json(wire))
}
