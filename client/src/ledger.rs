//! Optimistic echo ledger
//!
//! 发送即上屏：本地先插入一条乐观消息，服务端广播回来时按
//! `client_tag` 对账。对上的是回显 (确认本地那条)，对不上的是
//! 真正的新消息。
//!
//! 同一条消息可能经多个房间各送达一次 (会话房间 + 个人房间)，
//! 因此还按服务端消息 id 去重：见过的 id 一律判为重复。

use std::collections::{HashMap, HashSet};

use shared::models::ChatMessage;

/// Outcome of reconciling one inbound message
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// Confirms a pending local message; `local_tag` identifies it
    ConfirmedLocal { local_tag: String },
    /// A message from someone else (or an untagged one of ours)
    NewRemote,
    /// Echo of an already-confirmed tag; drop it
    Duplicate,
}

/// Tracks locally originated messages awaiting their server echo
#[derive(Debug, Default)]
pub struct MessageLedger {
    /// tag -> pending body
    pending: HashMap<String, String>,
    /// tags whose echo already arrived
    confirmed: HashMap<String, String>,
    /// server message ids already delivered on any path
    seen: HashSet<String>,
}

impl MessageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an optimistic local message before it is sent
    pub fn record_local(&mut self, tag: impl Into<String>, body: impl Into<String>) {
        self.pending.insert(tag.into(), body.into());
    }

    /// Classify an inbound broadcast
    pub fn reconcile(&mut self, message: &ChatMessage) -> Reconciliation {
        // Id first: the same persisted message can arrive via both the
        // chat room and a personal room
        if !message.id.is_empty() && !self.seen.insert(message.id.clone()) {
            return Reconciliation::Duplicate;
        }

        let Some(tag) = message.client_tag.as_deref() else {
            return Reconciliation::NewRemote;
        };

        if self.pending.remove(tag).is_some() {
            // Server id now known for this local message
            self.confirmed.insert(tag.to_string(), message.id.clone());
            return Reconciliation::ConfirmedLocal {
                local_tag: tag.to_string(),
            };
        }

        if self.confirmed.contains_key(tag) {
            return Reconciliation::Duplicate;
        }

        // Tagged, but not ours (another device of the same user)
        Reconciliation::NewRemote
    }

    /// Tags still waiting for their echo (candidates for resend after
    /// a reconnect)
    pub fn pending_tags(&self) -> Vec<String> {
        self.pending.keys().cloned().collect()
    }

    /// Body of a pending local message
    pub fn pending_body(&self, tag: &str) -> Option<&str> {
        self.pending.get(tag).map(|s| s.as_str())
    }

    /// Server-assigned id for a confirmed tag
    pub fn confirmed_id(&self, tag: &str) -> Option<&str> {
        self.confirmed.get(tag).map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::Role;

    fn broadcast(tag: Option<&str>) -> ChatMessage {
        broadcast_with_id("message:m1", tag)
    }

    fn broadcast_with_id(id: &str, tag: Option<&str>) -> ChatMessage {
        ChatMessage {
            id: id.into(),
            conversation: "conversation:c1".into(),
            sender: "user:alice".into(),
            sender_role: Role::Customer,
            body: "hello".into(),
            client_tag: tag.map(|t| t.to_string()),
            created_at: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_echo_confirms_pending_message() {
        let mut ledger = MessageLedger::new();
        ledger.record_local("tag-1", "hello");

        let result = ledger.reconcile(&broadcast(Some("tag-1")));
        assert_eq!(
            result,
            Reconciliation::ConfirmedLocal { local_tag: "tag-1".into() }
        );
        assert_eq!(ledger.confirmed_id("tag-1"), Some("message:m1"));
        assert!(ledger.pending_tags().is_empty());
    }

    #[test]
    fn test_second_echo_is_duplicate() {
        let mut ledger = MessageLedger::new();
        ledger.record_local("tag-1", "hello");
        ledger.reconcile(&broadcast(Some("tag-1")));

        assert_eq!(ledger.reconcile(&broadcast(Some("tag-1"))), Reconciliation::Duplicate);
    }

    #[test]
    fn test_untagged_message_is_remote() {
        let mut ledger = MessageLedger::new();
        assert_eq!(ledger.reconcile(&broadcast(None)), Reconciliation::NewRemote);
    }

    #[test]
    fn test_foreign_tag_is_remote() {
        let mut ledger = MessageLedger::new();
        ledger.record_local("tag-1", "hello");
        assert_eq!(
            ledger.reconcile(&broadcast(Some("someone-elses-tag"))),
            Reconciliation::NewRemote
        );
        // Our pending entry is untouched
        assert_eq!(ledger.pending_tags(), vec!["tag-1".to_string()]);
    }

    #[test]
    fn test_same_id_delivered_twice_is_duplicate() {
        // An admin message reaches a customer via both the chat room
        // and their personal room; only the first delivery renders
        let mut ledger = MessageLedger::new();
        assert_eq!(
            ledger.reconcile(&broadcast(Some("someone-elses-tag"))),
            Reconciliation::NewRemote
        );
        assert_eq!(
            ledger.reconcile(&broadcast(Some("someone-elses-tag"))),
            Reconciliation::Duplicate
        );
    }

    #[test]
    fn test_same_untagged_id_delivered_twice_is_duplicate() {
        let mut ledger = MessageLedger::new();
        assert_eq!(ledger.reconcile(&broadcast(None)), Reconciliation::NewRemote);
        assert_eq!(ledger.reconcile(&broadcast(None)), Reconciliation::Duplicate);
    }

    #[test]
    fn test_distinct_ids_are_not_deduplicated() {
        let mut ledger = MessageLedger::new();
        assert_eq!(
            ledger.reconcile(&broadcast_with_id("message:m1", None)),
            Reconciliation::NewRemote
        );
        assert_eq!(
            ledger.reconcile(&broadcast_with_id("message:m2", None)),
            Reconciliation::NewRemote
        );
    }
}
