use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use skillswap_common::{AppError, Page, PageRequest};
use skillswap_database::{AdminMessage, MarketplaceStore, Notification};

use crate::state::AppState;

/// A user's inbox and the admin messages currently addressed to them.
pub struct NotificationService {
    store: Arc<dyn MarketplaceStore>,
}

impl NotificationService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
        }
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: PageRequest,
    ) -> Result<Page<Notification>, AppError> {
        self.store.list_notifications(user_id, unread_only, page).await
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<u64, AppError> {
        self.store.unread_count(user_id).await
    }

    pub async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<(), AppError> {
        if !self.store.mark_read(user_id, notification_id).await? {
            return Err(not_found());
        }
        Ok(())
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, AppError> {
        let updated = self.store.mark_all_read(user_id).await?;
        tracing::debug!(%user_id, updated, "Notifications marked read");
        Ok(updated)
    }

    pub async fn delete(&self, user_id: Uuid, notification_id: Uuid) -> Result<(), AppError> {
        if !self.store.delete_notification(user_id, notification_id).await? {
            return Err(not_found());
        }
        Ok(())
    }

    pub async fn active_messages(&self, user_id: Uuid) -> Result<Vec<AdminMessage>, AppError> {
        self.store.visible_admin_messages(user_id, Utc::now()).await
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Notification not found".to_string())
}
