//! Connection Registry
//!
//! 连接表 + 房间表。每条连接持有一个无界发送通道，网关的写循环
//! 从通道读出事件并写回 WebSocket。注册表本身不关心传输层，
//! 因此测试可以直接挂假通道。

use std::collections::HashSet;

use dashmap::DashMap;
use shared::realtime::ServerEvent;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::rooms::{Actor, RoomId, enrollment_rooms};

/// Opaque connection identifier
pub type ConnectionId = Uuid;

struct ConnectionHandle {
    actor: Actor,
    sender: mpsc::UnboundedSender<ServerEvent>,
}

/// Live connection and room membership tables
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, ConnectionHandle>,
    rooms: DashMap<RoomId, HashSet<ConnectionId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection and enroll it in its identity rooms
    pub fn register(
        &self,
        actor: Actor,
        sender: mpsc::UnboundedSender<ServerEvent>,
    ) -> ConnectionId {
        let id = Uuid::new_v4();
        self.connections
            .insert(id, ConnectionHandle { actor: actor.clone(), sender });

        for room in enrollment_rooms(&actor) {
            self.join(id, room);
        }

        id
    }

    /// Remove a connection from every room and drop its handle
    pub fn unregister(&self, id: ConnectionId) {
        self.connections.remove(&id);
        self.rooms.retain(|_, members| {
            members.remove(&id);
            !members.is_empty()
        });
    }

    /// Enroll a connection in a room (idempotent)
    pub fn join(&self, id: ConnectionId, room: RoomId) {
        self.rooms.entry(room).or_default().insert(id);
    }

    /// Whether a connection is currently a member of a room
    pub fn is_member(&self, id: ConnectionId, room: &RoomId) -> bool {
        self.rooms
            .get(room)
            .map(|members| members.contains(&id))
            .unwrap_or(false)
    }

    /// Actor identity of a connection
    pub fn actor_of(&self, id: ConnectionId) -> Option<Actor> {
        self.connections.get(&id).map(|h| h.actor.clone())
    }

    /// Send one event to a single connection.
    ///
    /// Failures mean the receive loop already dropped; the gateway
    /// unregisters the connection on close, so errors are swallowed.
    pub fn send_to(&self, id: ConnectionId, event: ServerEvent) {
        if let Some(handle) = self.connections.get(&id) {
            let _ = handle.sender.send(event);
        }
    }

    /// Broadcast an event to every member of a room
    pub fn broadcast(&self, room: &RoomId, event: &ServerEvent) {
        self.broadcast_inner(room, event, None);
    }

    /// Broadcast to a room, skipping one connection (typically the sender)
    pub fn broadcast_except(&self, room: &RoomId, except: ConnectionId, event: &ServerEvent) {
        self.broadcast_inner(room, event, Some(except));
    }

    fn broadcast_inner(&self, room: &RoomId, event: &ServerEvent, except: Option<ConnectionId>) {
        let Some(members) = self.rooms.get(room) else {
            return;
        };

        for member in members.iter() {
            if Some(*member) == except {
                continue;
            }
            if let Some(handle) = self.connections.get(member) {
                let _ = handle.sender.send(event.clone());
            }
        }
    }

    /// Number of live members in a room
    pub fn room_size(&self, room: &RoomId) -> usize {
        self.rooms.get(room).map(|m| m.len()).unwrap_or(0)
    }

    /// Total live connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connect(
        registry: &ConnectionRegistry,
        actor: Actor,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = registry.register(actor, tx);
        (id, rx)
    }

    #[test]
    fn test_register_enrolls_identity_rooms() {
        let registry = ConnectionRegistry::new();
        let (customer, _rx1) = connect(&registry, Actor::Customer { id: "user:a".into() });
        let (admin, _rx2) = connect(&registry, Actor::Admin { id: "user:b".into() });

        assert!(registry.is_member(customer, &RoomId::User("user:a".into())));
        assert!(!registry.is_member(customer, &RoomId::Admins));
        assert!(registry.is_member(admin, &RoomId::Admins));
    }

    #[test]
    fn test_join_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let (id, _rx) = connect(&registry, Actor::Customer { id: "user:a".into() });

        let room = RoomId::Chat("conversation:c1".into());
        registry.join(id, room.clone());
        registry.join(id, room.clone());

        assert_eq!(registry.room_size(&room), 1);
    }

    #[test]
    fn test_broadcast_reaches_all_members() {
        let registry = ConnectionRegistry::new();
        let (a, mut rx_a) = connect(&registry, Actor::Customer { id: "user:a".into() });
        let (b, mut rx_b) = connect(&registry, Actor::Admin { id: "user:b".into() });

        let room = RoomId::Chat("conversation:c1".into());
        registry.join(a, room.clone());
        registry.join(b, room.clone());

        registry.broadcast(&room, &ServerEvent::error("ping"));

        assert!(matches!(rx_a.try_recv(), Ok(ServerEvent::Error { .. })));
        assert!(matches!(rx_b.try_recv(), Ok(ServerEvent::Error { .. })));
    }

    #[test]
    fn test_broadcast_except_skips_sender() {
        let registry = ConnectionRegistry::new();
        let (a, mut rx_a) = connect(&registry, Actor::Customer { id: "user:a".into() });
        let (b, mut rx_b) = connect(&registry, Actor::Admin { id: "user:b".into() });

        let room = RoomId::Chat("conversation:c1".into());
        registry.join(a, room.clone());
        registry.join(b, room.clone());

        registry.broadcast_except(&room, a, &ServerEvent::error("typing"));

        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn test_unregister_leaves_all_rooms() {
        let registry = ConnectionRegistry::new();
        let (id, _rx) = connect(&registry, Actor::Customer { id: "user:a".into() });
        let room = RoomId::Chat("conversation:c1".into());
        registry.join(id, room.clone());

        registry.unregister(id);

        assert_eq!(registry.room_size(&room), 0);
        assert_eq!(registry.connection_count(), 0);
        assert!(registry.actor_of(id).is_none());
    }
}
