//! WebSocket Gateway
//!
//! `/ws?token=<jwt>` — 升级前校验令牌，升级后一条连接两个方向：
//! 入站帧解析为 [`ClientEvent`] 交给中继，出站事件从注册表通道
//! 读出写回套接字。连接关闭时注销。

use axum::{
    Router,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Response},
    routing::get,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use shared::models::Role;
use shared::realtime::ClientEvent;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::realtime::Actor;
use crate::utils::AppError;

pub fn router() -> Router<ServerState> {
    Router::new().route("/ws", get(ws_handler))
}

#[derive(Debug, Deserialize)]
struct WsQuery {
    token: String,
}

/// Token is validated *before* the upgrade; a bad token never costs a
/// WebSocket handshake.
async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<ServerState>,
) -> Response {
    let claims = match state.get_jwt_service().validate_token(&query.token) {
        Ok(claims) => claims,
        Err(e) => {
            warn!(target: "security", event = "ws_auth_failed", error = %e);
            return AppError::unauthorized().into_response();
        }
    };

    let user = CurrentUser::from(claims);
    let actor = match user.role {
        Role::Admin => Actor::Admin { id: user.id },
        Role::Customer => Actor::Customer { id: user.id },
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, actor))
}

async fn handle_socket(socket: WebSocket, state: ServerState, actor: Actor) {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let conn_id = state.registry.register(actor.clone(), event_tx);
    info!(actor = %actor.id(), connection = %conn_id, "WebSocket connected");

    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            // Outbound: registry fan-out -> socket
            outbound = event_rx.recv() => {
                let Some(event) = outbound else { break };
                let Ok(text) = serde_json::to_string(&event) else { continue };
                if ws_tx.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }

            // Inbound: socket -> relay
            inbound = ws_rx.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientEvent>(text.as_str()) {
                            Ok(event) => {
                                state.relay.handle_event(conn_id, &actor, event).await;
                            }
                            Err(e) => {
                                debug!(connection = %conn_id, error = %e, "Unparseable client frame");
                                state.registry.send_to(
                                    conn_id,
                                    shared::realtime::ServerEvent::error("Malformed event"),
                                );
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // ping/pong/binary ignored
                    Some(Err(e)) => {
                        debug!(connection = %conn_id, error = %e, "WebSocket read error");
                        break;
                    }
                }
            }
        }
    }

    state.registry.unregister(conn_id);
    info!(actor = %actor.id(), connection = %conn_id, "WebSocket disconnected");
}
