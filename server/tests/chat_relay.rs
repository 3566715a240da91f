//! 聊天中继集成测试 (内存数据库 + 假连接)

use quickmart_server::core::{Config, ServerState};
use quickmart_server::db::repository::ChatRepository;
use quickmart_server::realtime::{Actor, ConnectionId, RoomId};
use shared::models::Role;
use shared::realtime::{ClientEvent, ServerEvent};
use tokio::sync::mpsc;

async fn test_state() -> ServerState {
    ServerState::initialize_in_memory(&Config::default())
        .await
        .expect("failed to initialize in-memory state")
}

fn connect(
    state: &ServerState,
    actor: Actor,
) -> (ConnectionId, mpsc::UnboundedReceiver<ServerEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let id = state.registry.register(actor, tx);
    (id, rx)
}

async fn seed_conversation(state: &ServerState, customer: &str) -> String {
    let repo = ChatRepository::new(state.get_db());
    let conversation = repo
        .get_or_create(customer)
        .await
        .expect("failed to create conversation");
    conversation
        .id
        .expect("conversation has no id")
        .to_string()
}

fn drain(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        events.push(ev);
    }
    events
}

#[tokio::test]
async fn send_message_persists_then_broadcasts() {
    let state = test_state().await;
    let conversation_id = seed_conversation(&state, "user:alice").await;

    let customer = Actor::Customer { id: "user:alice".into() };
    let admin = Actor::Admin { id: "user:boss".into() };
    let (customer_conn, mut customer_rx) = connect(&state, customer.clone());
    let (admin_conn, mut admin_rx) = connect(&state, admin.clone());

    state
        .relay
        .handle_event(
            customer_conn,
            &customer,
            ClientEvent::JoinChat { conversation_id: conversation_id.clone() },
        )
        .await;
    state
        .relay
        .handle_event(
            admin_conn,
            &admin,
            ClientEvent::JoinChat { conversation_id: conversation_id.clone() },
        )
        .await;

    state
        .relay
        .handle_event(
            customer_conn,
            &customer,
            ClientEvent::SendMessage {
                conversation_id: conversation_id.clone(),
                body: "  do you have oat milk?  ".into(),
                client_tag: Some("tag-123".into()),
            },
        )
        .await;

    // Message is durable before any broadcast
    let repo = ChatRepository::new(state.get_db());
    let messages = repo
        .messages(&conversation_id, 100, 0)
        .await
        .expect("failed to read messages");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].body, "do you have oat milk?");
    assert_eq!(messages[0].client_tag.as_deref(), Some("tag-123"));

    // Both room members get the NewMessage, with the tag echoed
    let customer_events = drain(&mut customer_rx);
    assert!(customer_events.iter().any(|e| matches!(
        e,
        ServerEvent::NewMessage { message } if message.client_tag.as_deref() == Some("tag-123")
    )));

    // Admin sees NewMessage (chat room) and ConversationUpdated (admin_room)
    let admin_events = drain(&mut admin_rx);
    assert!(admin_events
        .iter()
        .any(|e| matches!(e, ServerEvent::NewMessage { .. })));
    assert!(admin_events
        .iter()
        .any(|e| matches!(e, ServerEvent::ConversationUpdated { .. })));

    // A customer message bumps the admin-side unread counter
    let conversation = repo
        .find_by_id(&conversation_id)
        .await
        .expect("lookup failed")
        .expect("conversation missing");
    assert_eq!(conversation.unread.admin, 1);
    assert_eq!(conversation.unread.customer, 0);
    assert_eq!(conversation.last_message.as_deref(), Some("do you have oat milk?"));
}

#[tokio::test]
async fn empty_body_is_rejected_without_persisting() {
    let state = test_state().await;
    let conversation_id = seed_conversation(&state, "user:alice").await;

    let customer = Actor::Customer { id: "user:alice".into() };
    let (conn, mut rx) = connect(&state, customer.clone());

    state
        .relay
        .handle_event(
            conn,
            &customer,
            ClientEvent::SendMessage {
                conversation_id: conversation_id.clone(),
                body: "   ".into(),
                client_tag: None,
            },
        )
        .await;

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(e, ServerEvent::Error { .. })));

    let repo = ChatRepository::new(state.get_db());
    let messages = repo
        .messages(&conversation_id, 100, 0)
        .await
        .expect("failed to read messages");
    assert!(messages.is_empty());
}

#[tokio::test]
async fn customer_cannot_join_foreign_conversation() {
    let state = test_state().await;
    let conversation_id = seed_conversation(&state, "user:alice").await;

    let intruder = Actor::Customer { id: "user:mallory".into() };
    let (conn, mut rx) = connect(&state, intruder.clone());

    state
        .relay
        .handle_event(
            conn,
            &intruder,
            ClientEvent::JoinChat { conversation_id: conversation_id.clone() },
        )
        .await;

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(e, ServerEvent::Error { .. })));
    assert!(!state.registry.is_member(conn, &RoomId::Chat(conversation_id)));
}

#[tokio::test]
async fn admin_may_join_any_conversation() {
    let state = test_state().await;
    let conversation_id = seed_conversation(&state, "user:alice").await;

    let admin = Actor::Admin { id: "user:boss".into() };
    let (conn, mut rx) = connect(&state, admin.clone());

    state
        .relay
        .handle_event(
            conn,
            &admin,
            ClientEvent::JoinChat { conversation_id: conversation_id.clone() },
        )
        .await;

    assert!(drain(&mut rx).is_empty());
    assert!(state.registry.is_member(conn, &RoomId::Chat(conversation_id)));
}

#[tokio::test]
async fn typing_is_relayed_but_never_persisted() {
    let state = test_state().await;
    let conversation_id = seed_conversation(&state, "user:alice").await;

    let customer = Actor::Customer { id: "user:alice".into() };
    let admin = Actor::Admin { id: "user:boss".into() };
    let (customer_conn, mut customer_rx) = connect(&state, customer.clone());
    let (admin_conn, mut admin_rx) = connect(&state, admin.clone());

    for (conn, actor) in [(customer_conn, &customer), (admin_conn, &admin)] {
        state
            .relay
            .handle_event(
                conn,
                actor,
                ClientEvent::JoinChat { conversation_id: conversation_id.clone() },
            )
            .await;
    }

    state
        .relay
        .handle_event(
            customer_conn,
            &customer,
            ClientEvent::Typing {
                conversation_id: conversation_id.clone(),
                is_typing: true,
            },
        )
        .await;

    // Sender is skipped, the other member is notified
    assert!(drain(&mut customer_rx).is_empty());
    let admin_events = drain(&mut admin_rx);
    assert!(admin_events.iter().any(|e| matches!(
        e,
        ServerEvent::UserTyping { identity_id, is_typing: true } if identity_id == "user:alice"
    )));

    let repo = ChatRepository::new(state.get_db());
    let messages = repo
        .messages(&conversation_id, 100, 0)
        .await
        .expect("failed to read messages");
    assert!(messages.is_empty());
}

#[tokio::test]
async fn typing_outside_joined_room_is_dropped() {
    let state = test_state().await;
    let conversation_id = seed_conversation(&state, "user:alice").await;

    let customer = Actor::Customer { id: "user:alice".into() };
    let (conn, _rx) = connect(&state, customer.clone());

    let admin = Actor::Admin { id: "user:boss".into() };
    let (admin_conn, mut admin_rx) = connect(&state, admin.clone());
    state
        .relay
        .handle_event(
            admin_conn,
            &admin,
            ClientEvent::JoinChat { conversation_id: conversation_id.clone() },
        )
        .await;

    // Customer never joined the room, so the indicator goes nowhere
    state
        .relay
        .handle_event(
            conn,
            &customer,
            ClientEvent::Typing {
                conversation_id,
                is_typing: true,
            },
        )
        .await;

    assert!(drain(&mut admin_rx).is_empty());
}

#[tokio::test]
async fn send_lock_entry_is_evicted_when_idle() {
    let state = test_state().await;
    let conversation_id = seed_conversation(&state, "user:alice").await;

    let customer = Actor::Customer { id: "user:alice".into() };
    let (conn, _rx) = connect(&state, customer.clone());
    state
        .relay
        .handle_event(
            conn,
            &customer,
            ClientEvent::JoinChat { conversation_id: conversation_id.clone() },
        )
        .await;

    for body in ["first", "second"] {
        state
            .relay
            .handle_event(
                conn,
                &customer,
                ClientEvent::SendMessage {
                    conversation_id: conversation_id.clone(),
                    body: body.into(),
                    client_tag: None,
                },
            )
            .await;
    }

    // No sends in flight, so the lock table is empty again
    assert_eq!(state.relay.active_send_locks(), 0);
}

#[tokio::test]
async fn reading_returns_the_post_reset_counter() {
    let state = test_state().await;
    let conversation_id = seed_conversation(&state, "user:alice").await;
    let repo = ChatRepository::new(state.get_db());

    repo.record_incoming(&conversation_id, "hello", 1_700_000_000_000, Role::Admin)
        .await
        .expect("summary update failed");

    // The returned record must already reflect the reset, so handlers
    // never respond with a stale badge count
    let conversation = repo
        .reset_unread(&conversation_id, Role::Customer)
        .await
        .expect("reset failed");
    assert_eq!(conversation.unread.customer, 0);
}

#[tokio::test]
async fn joining_resets_own_unread_counter() {
    let state = test_state().await;
    let conversation_id = seed_conversation(&state, "user:alice").await;
    let repo = ChatRepository::new(state.get_db());

    // An admin message bumps the customer counter
    let admin = Actor::Admin { id: "user:boss".into() };
    let (admin_conn, _admin_rx) = connect(&state, admin.clone());
    state
        .relay
        .handle_event(
            admin_conn,
            &admin,
            ClientEvent::JoinChat { conversation_id: conversation_id.clone() },
        )
        .await;
    state
        .relay
        .handle_event(
            admin_conn,
            &admin,
            ClientEvent::SendMessage {
                conversation_id: conversation_id.clone(),
                body: "hello!".into(),
                client_tag: None,
            },
        )
        .await;

    let before = repo
        .find_by_id(&conversation_id)
        .await
        .expect("lookup failed")
        .expect("conversation missing");
    assert_eq!(before.unread.customer, 1);

    // Customer joining the room counts as reading
    let customer = Actor::Customer { id: "user:alice".into() };
    let (conn, _rx) = connect(&state, customer.clone());
    state
        .relay
        .handle_event(
            conn,
            &customer,
            ClientEvent::JoinChat { conversation_id: conversation_id.clone() },
        )
        .await;

    let after = repo
        .find_by_id(&conversation_id)
        .await
        .expect("lookup failed")
        .expect("conversation missing");
    assert_eq!(after.unread.customer, 0);
    // Admin side untouched
    assert_eq!(after.unread.admin, before.unread.admin);
}
