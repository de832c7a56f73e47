use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use skillswap_common::{AppError, FieldError, Page, PageRequest};
use skillswap_database::{AdminMessage, MarketplaceStore, NewAdminMessage, User, UserSearch};

use crate::connection_manager::ConnectionManager;
use crate::models::*;
use crate::notifier::Notifier;
use crate::state::AppState;

/// Moderation, dashboard figures and broadcast messages.
pub struct AdminService {
    store: Arc<dyn MarketplaceStore>,
    notifier: Notifier,
    connections: ConnectionManager,
}

impl AdminService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            notifier: state.notifier.clone(),
            connections: state.connection_manager.clone(),
        }
    }

    pub async fn dashboard(&self) -> Result<DashboardStats, AppError> {
        Ok(DashboardStats {
            users: self.store.user_stats().await?,
            swaps: self.store.swap_status_counts(None).await?,
            admin_messages: self.store.count_admin_messages().await?,
            online_users: self.connections.online_user_count(),
        })
    }

    /// Every account, private and banned ones included.
    pub async fn list_users(&self, query: UserQuery, page: PageRequest) -> Result<Page<User>, AppError> {
        let search = UserSearch {
            text: query.q.filter(|q| !q.trim().is_empty()),
            skill: query.skill.filter(|s| !s.trim().is_empty()),
            availability: query.availability,
            location: query.location.filter(|l| !l.trim().is_empty()),
            exclude: None,
            include_private: true,
            include_banned: true,
        };
        self.store.search_users(&search, page).await
    }

    pub async fn ban(&self, admin: &User, user_id: Uuid) -> Result<User, AppError> {
        let target = self.load_user(user_id).await?;
        if target.is_admin {
            return Err(AppError::Validation("Cannot ban an administrator".to_string()));
        }

        // The store refuses too, in case the flag flipped in between
        let banned = self
            .store
            .set_banned(user_id, true)
            .await?
            .ok_or_else(|| AppError::Validation("Cannot ban an administrator".to_string()))?;

        tracing::info!(admin = %admin.id, user_id = %banned.id, "User banned");
        Ok(banned)
    }

    pub async fn unban(&self, admin: &User, user_id: Uuid) -> Result<User, AppError> {
        let unbanned = self
            .store
            .set_banned(user_id, false)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        tracing::info!(admin = %admin.id, user_id = %unbanned.id, "User unbanned");
        Ok(unbanned)
    }

    pub async fn set_admin(&self, admin: &User, user_id: Uuid, is_admin: bool) -> Result<User, AppError> {
        if admin.id == user_id && !is_admin {
            return Err(AppError::Validation(
                "You cannot revoke your own administrator access".to_string(),
            ));
        }

        let target = self.load_user(user_id).await?;
        if is_admin && target.is_banned {
            return Err(AppError::Validation(
                "Cannot grant administrator access to a banned user".to_string(),
            ));
        }

        let updated = self
            .store
            .set_admin(user_id, is_admin)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        tracing::info!(admin = %admin.id, user_id = %updated.id, is_admin, "Administrator flag changed");
        Ok(updated)
    }

    pub async fn create_message(
        &self,
        admin: &User,
        request: CreateAdminMessageRequest,
    ) -> Result<AdminMessageCreated, AppError> {
        let now = Utc::now();
        if let Some(expires_at) = request.expires_at {
            if expires_at <= now {
                return Err(AppError::InvalidFields(vec![FieldError::new(
                    "expires_at",
                    "Expiry must be in the future",
                )]));
            }
        }
        if !request.is_global && request.target_user_ids.is_empty() {
            return Err(AppError::InvalidFields(vec![FieldError::new(
                "target_user_ids",
                "Targeted messages need at least one recipient",
            )]));
        }

        let mut targets = Vec::with_capacity(request.target_user_ids.len());
        if !request.is_global {
            for id in request.target_user_ids {
                if !targets.contains(&id) {
                    targets.push(id);
                }
            }
        }

        let message = self
            .store
            .insert_admin_message(NewAdminMessage {
                title: request.title.trim().to_string(),
                message: request.message.trim().to_string(),
                kind: request.kind,
                is_active: request.is_active,
                is_global: request.is_global,
                target_user_ids: targets,
                expires_at: request.expires_at,
                created_by: admin.id,
            })
            .await?;

        tracing::info!(admin = %admin.id, message_id = %message.id, global = message.is_global, "Admin message created");

        let delivered = if message.is_active {
            let recipients = self.recipients(&message).await?;
            self.notifier.broadcast(&message, &recipients).await
        } else {
            0
        };

        Ok(AdminMessageCreated { message, delivered })
    }

    /// Non-banned users the message is addressed to.
    async fn recipients(&self, message: &AdminMessage) -> Result<Vec<Uuid>, AppError> {
        let active = self.store.active_user_ids().await?;
        if message.is_global {
            return Ok(active);
        }
        Ok(active
            .into_iter()
            .filter(|id| message.target_user_ids.contains(id))
            .collect())
    }

    pub async fn list_messages(&self, page: PageRequest) -> Result<Page<AdminMessage>, AppError> {
        self.store.list_admin_messages(page).await
    }

    /// Applies the given changes. Activating a message that was inactive fans
    /// it out the same way creation does.
    pub async fn update_message(
        &self,
        admin: &User,
        message_id: Uuid,
        request: UpdateAdminMessageRequest,
    ) -> Result<AdminMessage, AppError> {
        let mut message = self
            .store
            .find_admin_message(message_id)
            .await?
            .ok_or_else(message_not_found)?;
        let was_active = message.is_active;

        if let Some(title) = request.title {
            message.title = title.trim().to_string();
        }
        if let Some(body) = request.message {
            message.message = body.trim().to_string();
        }
        if let Some(kind) = request.kind {
            message.kind = kind;
        }
        if let Some(is_active) = request.is_active {
            message.is_active = is_active;
        }
        match request.expires_at {
            Some(Some(expires_at)) if expires_at <= Utc::now() => {
                return Err(AppError::InvalidFields(vec![FieldError::new(
                    "expires_at",
                    "Expiry must be in the future",
                )]));
            }
            Some(expires_at) => message.expires_at = expires_at,
            None => {}
        }

        let updated = self
            .store
            .update_admin_message(&message)
            .await?
            .ok_or_else(message_not_found)?;

        tracing::info!(admin = %admin.id, message_id = %updated.id, "Admin message updated");

        if !was_active && updated.is_visible(Utc::now()) {
            let recipients = self.recipients(&updated).await?;
            self.notifier.broadcast(&updated, &recipients).await;
        }
        Ok(updated)
    }

    pub async fn delete_message(&self, admin: &User, message_id: Uuid) -> Result<(), AppError> {
        if !self.store.delete_admin_message(message_id).await? {
            return Err(message_not_found());
        }
        tracing::info!(admin = %admin.id, %message_id, "Admin message deleted");
        Ok(())
    }

    async fn load_user(&self, user_id: Uuid) -> Result<User, AppError> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}

fn message_not_found() -> AppError {
    AppError::NotFound("Admin message not found".to_string())
}
