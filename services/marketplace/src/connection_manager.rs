use std::sync::Arc;

use axum::extract::ws::Message;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

// Type alias for WebSocket sender
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Frame pushed to clients: `{"event": ..., "payload": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PushEvent {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl PushEvent {
    pub fn new<T: Serialize>(event: impl Into<String>, payload: &T) -> Self {
        let event = event.into();
        let payload = match serde_json::to_value(payload) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(event = %event, "Failed to serialize push payload: {}", e);
                None
            }
        };
        Self { event, payload }
    }

    pub fn pong() -> Self {
        Self {
            event: "pong".to_string(),
            payload: None,
        }
    }

    fn to_message(&self) -> Option<Message> {
        match serde_json::to_string(self) {
            Ok(text) => Some(Message::Text(text)),
            Err(e) => {
                tracing::warn!(event = %self.event, "Failed to encode push event: {}", e);
                None
            }
        }
    }
}

/// Live WebSocket connections per user. A user may hold several (one per
/// tab); each is tracked under its own connection id.
#[derive(Clone, Default)]
pub struct ConnectionManager {
    // user_id -> [(connection_id, sender)]
    connections: Arc<DashMap<Uuid, Vec<(Uuid, WsSender)>>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    // Register a sender and hand back its connection id
    pub fn add_connection(&self, user_id: Uuid, sender: WsSender) -> Uuid {
        let connection_id = Uuid::new_v4();
        self.connections
            .entry(user_id)
            .or_default()
            .push((connection_id, sender));

        tracing::info!(%user_id, %connection_id, "Push connection registered");
        connection_id
    }

    // Remove only this connection; other tabs stay subscribed
    pub fn remove_connection(&self, user_id: Uuid, connection_id: Uuid) {
        if let Some(mut connections) = self.connections.get_mut(&user_id) {
            connections.retain(|(id, _)| *id != connection_id);
        }
        self.connections.remove_if(&user_id, |_, connections| connections.is_empty());

        tracing::info!(%user_id, %connection_id, "Push connection removed");
    }

    /// Sends to every live connection of the user and returns how many
    /// accepted the frame. Closed senders are pruned.
    pub fn send_to_user(&self, user_id: Uuid, event: &PushEvent) -> usize {
        let Some(message) = event.to_message() else {
            return 0;
        };

        let delivered = match self.connections.get_mut(&user_id) {
            Some(mut connections) => {
                connections.retain(|(_, sender)| sender.send(message.clone()).is_ok());
                connections.len()
            }
            None => 0,
        };
        self.connections.remove_if(&user_id, |_, connections| connections.is_empty());

        delivered
    }

    /// Sends a raw frame to one connection. `false` when it is gone.
    pub fn send_to_connection(&self, user_id: Uuid, connection_id: Uuid, message: Message) -> bool {
        self.connections
            .get(&user_id)
            .and_then(|connections| {
                connections
                    .iter()
                    .find(|(id, _)| *id == connection_id)
                    .map(|(_, sender)| sender.send(message).is_ok())
            })
            .unwrap_or(false)
    }

    pub fn send_event_to_connection(&self, user_id: Uuid, connection_id: Uuid, event: &PushEvent) -> bool {
        match event.to_message() {
            Some(message) => self.send_to_connection(user_id, connection_id, message),
            None => false,
        }
    }

    pub fn connection_count(&self, user_id: Uuid) -> usize {
        self.connections
            .get(&user_id)
            .map(|connections| connections.len())
            .unwrap_or(0)
    }

    pub fn online_user_count(&self) -> usize {
        self.connections
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(message: Message) -> String {
        match message {
            Message::Text(text) => text,
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fan_out_to_every_tab() {
        let manager = ConnectionManager::new();
        let user = Uuid::new_v4();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        manager.add_connection(user, tx1);
        manager.add_connection(user, tx2);

        let event = PushEvent::new("swap_request", &serde_json::json!({"id": 1}));
        assert_eq!(manager.send_to_user(user, &event), 2);

        let first: PushEvent = serde_json::from_str(&text(rx1.recv().await.unwrap())).unwrap();
        let second: PushEvent = serde_json::from_str(&text(rx2.recv().await.unwrap())).unwrap();
        assert_eq!(first, event);
        assert_eq!(second, event);
    }

    #[tokio::test]
    async fn test_closing_one_tab_keeps_the_other() {
        let manager = ConnectionManager::new();
        let user = Uuid::new_v4();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let first = manager.add_connection(user, tx1);
        manager.add_connection(user, tx2);

        manager.remove_connection(user, first);
        assert_eq!(manager.connection_count(user), 1);

        assert_eq!(manager.send_to_user(user, &PushEvent::pong()), 1);
        assert_eq!(text(rx2.recv().await.unwrap()), r#"{"event":"pong"}"#);
    }

    #[tokio::test]
    async fn test_dropped_receivers_are_pruned() {
        let manager = ConnectionManager::new();
        let user = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        manager.add_connection(user, tx);
        drop(rx);

        assert_eq!(manager.send_to_user(user, &PushEvent::pong()), 0);
        assert_eq!(manager.connection_count(user), 0);
        assert_eq!(manager.online_user_count(), 0);
    }

    #[test]
    fn test_offline_user_receives_nothing() {
        let manager = ConnectionManager::new();
        assert_eq!(manager.send_to_user(Uuid::new_v4(), &PushEvent::pong()), 0);
    }
}
