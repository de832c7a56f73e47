use std::sync::Arc;

use uuid::Uuid;

use skillswap_common::{NotificationKind, RelatedEntity};
use skillswap_database::{AdminMessage, MarketplaceStore, NewNotification, Notification};

use crate::connection_manager::{ConnectionManager, PushEvent};

/// Persists inbox rows and mirrors them to live connections. Every call is
/// best-effort: failures are logged and never surface to the caller.
#[derive(Clone)]
pub struct Notifier {
    store: Arc<dyn MarketplaceStore>,
    connections: ConnectionManager,
}

impl Notifier {
    pub fn new(store: Arc<dyn MarketplaceStore>, connections: ConnectionManager) -> Self {
        Self { store, connections }
    }

    pub async fn notify(&self, notification: NewNotification) -> Option<Notification> {
        let user_id = notification.user_id;
        let kind = notification.kind;

        match self.store.insert_notification(notification).await {
            Ok(saved) => {
                let event = PushEvent::new(saved.kind.as_str(), &saved);
                let pushed = self.connections.send_to_user(saved.user_id, &event);
                tracing::debug!(%user_id, kind = kind.as_str(), pushed, "Notification stored");
                Some(saved)
            }
            Err(e) => {
                tracing::warn!(%user_id, kind = kind.as_str(), "Failed to store notification: {}", e);
                None
            }
        }
    }

    pub async fn notify_user(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        related: Option<RelatedEntity>,
    ) -> Option<Notification> {
        self.notify(NewNotification {
            user_id,
            kind,
            title: title.into(),
            message: message.into(),
            related,
        })
        .await
    }

    /// One `admin_message` notification per recipient, written independently.
    /// Returns how many were persisted.
    pub async fn broadcast(&self, message: &AdminMessage, recipients: &[Uuid]) -> u64 {
        let mut delivered = 0;
        for &user_id in recipients {
            let saved = self
                .notify_user(
                    user_id,
                    NotificationKind::AdminMessage,
                    message.title.clone(),
                    message.message.clone(),
                    Some(RelatedEntity::AdminMessage(message.id)),
                )
                .await;
            if saved.is_some() {
                delivered += 1;
            }
        }

        if delivered < recipients.len() as u64 {
            tracing::warn!(
                message_id = %message.id,
                delivered,
                recipients = recipients.len(),
                "Broadcast partially delivered"
            );
        } else {
            tracing::info!(message_id = %message.id, delivered, "Broadcast delivered");
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::ws::Message;
    use chrono::Utc;
    use skillswap_common::{AdminMessageKind, PageRequest};
    use skillswap_database::{MemoryStore, NotificationStore};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_notify_persists_and_pushes() {
        let store = Arc::new(MemoryStore::new());
        let connections = ConnectionManager::new();
        let notifier = Notifier::new(store.clone(), connections.clone());

        let user = Uuid::new_v4();
        let (tx, mut rx) = mpsc::unbounded_channel();
        connections.add_connection(user, tx);

        let swap_id = Uuid::new_v4();
        let saved = notifier
            .notify_user(
                user,
                NotificationKind::SwapAccepted,
                "Swap accepted",
                "Your request was accepted",
                Some(RelatedEntity::SwapRequest(swap_id)),
            )
            .await
            .unwrap();

        assert_eq!(store.unread_count(user).await.unwrap(), 1);

        let frame = match rx.recv().await.unwrap() {
            Message::Text(text) => serde_json::from_str::<serde_json::Value>(&text).unwrap(),
            other => panic!("unexpected frame: {:?}", other),
        };
        assert_eq!(frame["event"], "swap_accepted");
        assert_eq!(frame["payload"]["id"], saved.id.to_string());
        assert_eq!(frame["payload"]["related"]["kind"], "swap_request");
    }

    #[tokio::test]
    async fn test_broadcast_counts_deliveries() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Notifier::new(store.clone(), ConnectionManager::new());
        let now = Utc::now();
        let message = AdminMessage {
            id: Uuid::new_v4(),
            title: "Maintenance".into(),
            message: "Down at noon".into(),
            kind: AdminMessageKind::Maintenance,
            is_active: true,
            is_global: true,
            target_user_ids: vec![],
            expires_at: None,
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        };
        let recipients = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];

        assert_eq!(notifier.broadcast(&message, &recipients).await, 3);

        let inbox = store
            .list_notifications(recipients[0], false, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(inbox.total, 1);
        assert_eq!(inbox.items[0].kind, NotificationKind::AdminMessage);
    }
}
