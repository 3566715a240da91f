//! Chat session coordinator
//!
//! 一条 WebSocket 连接上的完整会话生命周期：
//!
//! ```text
//! connect ──▶ join ──▶ send/typing/recv ──▶ (连接断开)
//!    ▲                                          │
//!    └────────── 指数退避重连, 自动重新入房 ◀───┘
//! ```
//!
//! 发送走乐观回显：[`ChatSession::send_message`] 返回 `client_tag`，
//! 调用方立即上屏；服务端回包经 [`MessageLedger`] 对账后以
//! [`SessionEvent::MessageConfirmed`] 通知。

use std::collections::{HashMap, HashSet};

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared::models::{ChatMessage, Conversation};
use shared::realtime::{ClientEvent, ServerEvent};

use crate::backoff::Backoff;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::ledger::{MessageLedger, Reconciliation};
use crate::typing::TypingTracker;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Session-level events surfaced to the application
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A message from another participant
    MessageReceived(ChatMessage),
    /// Server echo confirming one of our optimistic messages
    MessageConfirmed { local_tag: String, message: ChatMessage },
    /// Conversation summary changed (unread, assignment, status)
    ConversationUpdated(Conversation),
    /// Someone else started or stopped typing
    Typing { identity_id: String, is_typing: bool },
    /// Server-side error for one of our operations
    ServerError(String),
    /// Connection was lost and re-established; rooms were re-joined
    Reconnected,
}

/// Chat session over one logical WebSocket connection
pub struct ChatSession {
    config: ClientConfig,
    sink: WsSink,
    source: WsSource,
    ledger: MessageLedger,
    backoff: Backoff,
    /// Conversations joined on this session; re-joined after reconnect
    joined: HashSet<String>,
    typing: HashMap<String, TypingTracker>,
}

impl ChatSession {
    /// Connect and authenticate
    pub async fn connect(config: ClientConfig) -> ClientResult<Self> {
        let (stream, _response) = connect_async(config.connect_url()).await?;
        let (sink, source) = stream.split();
        info!(url = %config.ws_url, "Chat session connected");

        let backoff = Backoff::new(config.reconnect.clone());
        Ok(Self {
            config,
            sink,
            source,
            ledger: MessageLedger::new(),
            backoff,
            joined: HashSet::new(),
            typing: HashMap::new(),
        })
    }

    /// Join a conversation room (idempotent server-side)
    pub async fn join(&mut self, conversation_id: impl Into<String>) -> ClientResult<()> {
        let conversation_id = conversation_id.into();
        self.send_event(&ClientEvent::JoinChat {
            conversation_id: conversation_id.clone(),
        })
        .await?;
        self.joined.insert(conversation_id);
        Ok(())
    }

    /// Send a message with an optimistic echo tag.
    ///
    /// Returns the generated `client_tag`; the caller should render the
    /// message immediately and mark it confirmed when
    /// [`SessionEvent::MessageConfirmed`] carries the same tag back.
    pub async fn send_message(
        &mut self,
        conversation_id: impl Into<String>,
        body: impl Into<String>,
    ) -> ClientResult<String> {
        let conversation_id = conversation_id.into();
        let body = body.into();
        let tag = Uuid::new_v4().to_string();

        self.ledger.record_local(&tag, &body);
        self.send_event(&ClientEvent::SendMessage {
            conversation_id: conversation_id.clone(),
            body,
            client_tag: Some(tag.clone()),
        })
        .await?;

        // Sending implies we stopped typing
        if let Some(tracker) = self.typing.get_mut(&conversation_id)
            && tracker.clear().is_some()
        {
            self.send_event(&ClientEvent::Typing {
                conversation_id,
                is_typing: false,
            })
            .await?;
        }

        Ok(tag)
    }

    /// Report the local input state; only transitions hit the wire
    pub async fn set_typing(
        &mut self,
        conversation_id: impl Into<String>,
        is_typing: bool,
    ) -> ClientResult<()> {
        let conversation_id = conversation_id.into();
        let tracker = self.typing.entry(conversation_id.clone()).or_default();

        if tracker.update(is_typing).is_none() {
            return Ok(());
        }

        self.send_event(&ClientEvent::Typing {
            conversation_id,
            is_typing,
        })
        .await
    }

    /// Next session event. Blocks until something arrives; transparently
    /// reconnects (with re-join) when the connection drops.
    pub async fn next_event(&mut self) -> ClientResult<SessionEvent> {
        loop {
            match self.source.next().await {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<ServerEvent>(text.as_str()) {
                        Ok(event) => {
                            if let Some(session_event) = self.translate(event) {
                                return Ok(session_event);
                            }
                        }
                        Err(e) => {
                            debug!(error = %e, "Unparseable server frame, skipping");
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    self.reconnect().await?;
                    return Ok(SessionEvent::Reconnected);
                }
                Some(Ok(_)) => {} // ping/pong/binary ignored
                Some(Err(e)) => {
                    warn!(error = %e, "WebSocket read error, reconnecting");
                    self.reconnect().await?;
                    return Ok(SessionEvent::Reconnected);
                }
            }
        }
    }

    /// Read access to the echo ledger (pending/confirmed tags)
    pub fn ledger(&self) -> &MessageLedger {
        &self.ledger
    }

    fn translate(&mut self, event: ServerEvent) -> Option<SessionEvent> {
        match event {
            ServerEvent::NewMessage { message } => match self.ledger.reconcile(&message) {
                Reconciliation::ConfirmedLocal { local_tag } => {
                    Some(SessionEvent::MessageConfirmed { local_tag, message })
                }
                Reconciliation::NewRemote => Some(SessionEvent::MessageReceived(message)),
                Reconciliation::Duplicate => {
                    debug!(id = %message.id, "Dropping duplicate echo");
                    None
                }
            },
            ServerEvent::ConversationUpdated { conversation } => {
                Some(SessionEvent::ConversationUpdated(conversation))
            }
            ServerEvent::UserTyping { identity_id, is_typing } => {
                Some(SessionEvent::Typing { identity_id, is_typing })
            }
            ServerEvent::Error { message } => Some(SessionEvent::ServerError(message)),
        }
    }

    async fn send_event(&mut self, event: &ClientEvent) -> ClientResult<()> {
        let text = serde_json::to_string(event)?;
        self.sink.send(Message::Text(text.into())).await?;
        Ok(())
    }

    /// Re-dial with exponential backoff, then re-join every room
    async fn reconnect(&mut self) -> ClientResult<()> {
        loop {
            let Some(delay) = self.backoff.next_delay() else {
                return Err(ClientError::ReconnectExhausted(self.backoff.attempts()));
            };

            info!(delay_ms = delay.as_millis() as u64, "Reconnecting");
            tokio::time::sleep(delay).await;

            match connect_async(self.config.connect_url()).await {
                Ok((stream, _response)) => {
                    let (sink, source) = stream.split();
                    self.sink = sink;
                    self.source = source;
                    self.backoff.reset();

                    // Typing state is stale after a gap
                    self.typing.clear();

                    let rooms: Vec<String> = self.joined.iter().cloned().collect();
                    for conversation_id in rooms {
                        self.send_event(&ClientEvent::JoinChat { conversation_id })
                            .await?;
                    }

                    info!("Chat session re-established");
                    return Ok(());
                }
                Err(e) => {
                    warn!(error = %e, "Reconnect attempt failed");
                }
            }
        }
    }
}
