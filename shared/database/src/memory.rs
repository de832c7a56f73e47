use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use skillswap_common::{fold_rating, AppError, Page, PageRequest, SwapStatus};

use crate::models::*;
use crate::store::*;

#[derive(Default)]
struct MemoryState {
    // Vectors keep insertion order, which serves as the stable tie-breaker.
    users: Vec<User>,
    swaps: Vec<SwapRequest>,
    notifications: Vec<Notification>,
    admin_messages: Vec<AdminMessage>,
}

/// Process-local store used by tests and `STORAGE_BACKEND=memory`.
///
/// Every conditional write runs under the write lock, so check-then-act is
/// atomic per record just like the conditional `UPDATE`s in [`crate::PgStore`].
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn user_mut<'a>(state: &'a mut MemoryState, id: Uuid) -> Option<&'a mut User> {
    state.users.iter_mut().find(|u| u.id == id)
}

fn swap_mut<'a>(state: &'a mut MemoryState, id: Uuid) -> Option<&'a mut SwapRequest> {
    state.swaps.iter_mut().find(|s| s.id == id)
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("An account with this email already exists".to_string()));
        }

        let now = Utc::now();
        let record = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            location: user.location,
            photo_url: None,
            bio: None,
            offered_skills: user.offered_skills,
            wanted_skills: user.wanted_skills,
            availability: user.availability,
            visibility: user.visibility,
            is_admin: false,
            is_banned: false,
            rating: 0.0,
            review_count: 0,
            created_at: now,
            updated_at: now,
        };
        state.users.push(record.clone());
        Ok(record)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn update_profile(&self, user: &User) -> Result<Option<User>, AppError> {
        let mut state = self.state.write().await;
        let Some(stored) = user_mut(&mut state, user.id) else {
            return Ok(None);
        };

        stored.name = user.name.clone();
        stored.location = user.location.clone();
        stored.photo_url = user.photo_url.clone();
        stored.bio = user.bio.clone();
        stored.offered_skills = user.offered_skills.clone();
        stored.wanted_skills = user.wanted_skills.clone();
        stored.availability = user.availability;
        stored.visibility = user.visibility;
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn set_banned(&self, id: Uuid, banned: bool) -> Result<Option<User>, AppError> {
        let mut state = self.state.write().await;
        match user_mut(&mut state, id) {
            Some(user) if banned && user.is_admin => Ok(None),
            Some(user) => {
                user.is_banned = banned;
                user.updated_at = Utc::now();
                Ok(Some(user.clone()))
            }
            None => Ok(None),
        }
    }

    async fn set_admin(&self, id: Uuid, admin: bool) -> Result<Option<User>, AppError> {
        let mut state = self.state.write().await;
        Ok(user_mut(&mut state, id).map(|user| {
            user.is_admin = admin;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn apply_rating(&self, id: Uuid, rating: u8) -> Result<Option<User>, AppError> {
        let mut state = self.state.write().await;
        Ok(user_mut(&mut state, id).map(|user| {
            user.rating = fold_rating(user.rating, user.review_count, rating);
            user.review_count += 1;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn search_users(&self, search: &UserSearch, page: PageRequest) -> Result<Page<User>, AppError> {
        let state = self.state.read().await;
        let found: Vec<User> = state
            .users
            .iter()
            .rev()
            .filter(|u| search.matches(u))
            .cloned()
            .collect();
        Ok(page.apply(found))
    }

    async fn find_skill_matches(
        &self,
        user: &User,
        include_private: bool,
        page: PageRequest,
    ) -> Result<Page<User>, AppError> {
        let state = self.state.read().await;
        let mut found: Vec<User> = state
            .users
            .iter()
            .filter(|v| v.id != user.id && v.is_discoverable(include_private) && user.complements(v))
            .cloned()
            .collect();
        // stable sort keeps insertion order for ties
        found.sort_by(|a, b| {
            b.rating
                .total_cmp(&a.rating)
                .then_with(|| b.review_count.cmp(&a.review_count))
        });
        Ok(page.apply(found))
    }

    async fn active_user_ids(&self) -> Result<Vec<Uuid>, AppError> {
        let state = self.state.read().await;
        Ok(state.users.iter().filter(|u| !u.is_banned).map(|u| u.id).collect())
    }

    async fn user_stats(&self) -> Result<UserStats, AppError> {
        let state = self.state.read().await;
        Ok(state.users.iter().fold(UserStats::default(), |mut stats, user| {
            stats.total += 1;
            if user.is_banned {
                stats.banned += 1;
            } else if user.is_public() {
                stats.public += 1;
            }
            if user.is_admin {
                stats.admins += 1;
            }
            stats
        }))
    }
}

#[async_trait]
impl SwapStore for MemoryStore {
    async fn insert_swap(&self, swap: NewSwapRequest) -> Result<SwapRequest, AppError> {
        let mut state = self.state.write().await;
        let duplicate = state.swaps.iter().any(|s| {
            s.status == SwapStatus::Pending && s.involves_pair(swap.requester_id, swap.recipient_id)
        });
        if duplicate {
            return Err(AppError::Conflict(
                "A pending swap request already exists between these users".to_string(),
            ));
        }

        let now = Utc::now();
        let record = SwapRequest {
            id: Uuid::new_v4(),
            requester_id: swap.requester_id,
            recipient_id: swap.recipient_id,
            offered_skill: swap.offered_skill,
            wanted_skill: swap.wanted_skill,
            message: swap.message,
            status: SwapStatus::Pending,
            feedback: SwapFeedback::default(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        state.swaps.push(record.clone());
        Ok(record)
    }

    async fn find_swap(&self, id: Uuid) -> Result<Option<SwapRequest>, AppError> {
        let state = self.state.read().await;
        Ok(state.swaps.iter().find(|s| s.id == id).cloned())
    }

    async fn find_pending_between(&self, a: Uuid, b: Uuid) -> Result<Option<SwapRequest>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .swaps
            .iter()
            .find(|s| s.status == SwapStatus::Pending && s.involves_pair(a, b))
            .cloned())
    }

    async fn transition_swap(
        &self,
        id: Uuid,
        from: SwapStatus,
        to: SwapStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<SwapRequest>, AppError> {
        let mut state = self.state.write().await;
        match swap_mut(&mut state, id) {
            Some(swap) if swap.status == from => {
                swap.status = to;
                swap.updated_at = at;
                if to == SwapStatus::Completed {
                    swap.completed_at = Some(at);
                }
                Ok(Some(swap.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn record_feedback(
        &self,
        id: Uuid,
        author: Participant,
        entry: FeedbackEntry,
    ) -> Result<Option<SwapRequest>, AppError> {
        let mut state = self.state.write().await;
        let recorded = match swap_mut(&mut state, id) {
            Some(swap)
                if swap.status == SwapStatus::Completed && swap.feedback.slot(author).is_none() =>
            {
                swap.updated_at = entry.submitted_at;
                *swap.feedback.slot_mut(author) = Some(entry.clone());
                swap.clone()
            }
            _ => return Ok(None),
        };

        if let Some(partner) = user_mut(&mut state, recorded.user_id_of(author.other())) {
            partner.rating = fold_rating(partner.rating, partner.review_count, entry.rating);
            partner.review_count += 1;
            partner.updated_at = entry.submitted_at;
        }
        Ok(Some(recorded))
    }

    async fn list_swaps(&self, filter: &SwapFilter, page: PageRequest) -> Result<Page<SwapRequest>, AppError> {
        let state = self.state.read().await;
        let found: Vec<SwapRequest> = state
            .swaps
            .iter()
            .rev()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        Ok(page.apply(found))
    }

    async fn swap_status_counts(&self, user_id: Option<Uuid>) -> Result<SwapStatusCounts, AppError> {
        let state = self.state.read().await;
        Ok(state
            .swaps
            .iter()
            .filter(|s| user_id.map_or(true, |u| s.participant(u).is_some()))
            .fold(SwapStatusCounts::default(), |mut counts, swap| {
                counts.add(swap.status, 1);
                counts
            }))
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, AppError> {
        let mut state = self.state.write().await;
        let record = Notification {
            id: Uuid::new_v4(),
            user_id: notification.user_id,
            kind: notification.kind,
            title: notification.title,
            message: notification.message,
            is_read: false,
            related: notification.related,
            created_at: Utc::now(),
        };
        state.notifications.push(record.clone());
        Ok(record)
    }

    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: PageRequest,
    ) -> Result<Page<Notification>, AppError> {
        let state = self.state.read().await;
        let found: Vec<Notification> = state
            .notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read))
            .cloned()
            .collect();
        Ok(page.apply(found))
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<u64, AppError> {
        let state = self.state.read().await;
        Ok(state
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as u64)
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        match state
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
        {
            Some(notification) => {
                notification.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, AppError> {
        let mut state = self.state.write().await;
        let mut updated = 0;
        for notification in state
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.is_read)
        {
            notification.is_read = true;
            updated += 1;
        }
        Ok(updated)
    }

    async fn delete_notification(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let before = state.notifications.len();
        state
            .notifications
            .retain(|n| !(n.id == id && n.user_id == user_id));
        Ok(state.notifications.len() < before)
    }
}

#[async_trait]
impl AdminMessageStore for MemoryStore {
    async fn insert_admin_message(&self, message: NewAdminMessage) -> Result<AdminMessage, AppError> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let record = AdminMessage {
            id: Uuid::new_v4(),
            title: message.title,
            message: message.message,
            kind: message.kind,
            is_active: message.is_active,
            is_global: message.is_global,
            target_user_ids: message.target_user_ids,
            expires_at: message.expires_at,
            created_by: message.created_by,
            created_at: now,
            updated_at: now,
        };
        state.admin_messages.push(record.clone());
        Ok(record)
    }

    async fn find_admin_message(&self, id: Uuid) -> Result<Option<AdminMessage>, AppError> {
        let state = self.state.read().await;
        Ok(state.admin_messages.iter().find(|m| m.id == id).cloned())
    }

    async fn list_admin_messages(&self, page: PageRequest) -> Result<Page<AdminMessage>, AppError> {
        let state = self.state.read().await;
        Ok(page.apply(state.admin_messages.iter().rev().cloned().collect()))
    }

    async fn update_admin_message(&self, message: &AdminMessage) -> Result<Option<AdminMessage>, AppError> {
        let mut state = self.state.write().await;
        Ok(state
            .admin_messages
            .iter_mut()
            .find(|m| m.id == message.id)
            .map(|stored| {
                stored.title = message.title.clone();
                stored.message = message.message.clone();
                stored.kind = message.kind;
                stored.is_active = message.is_active;
                stored.expires_at = message.expires_at;
                stored.updated_at = Utc::now();
                stored.clone()
            }))
    }

    async fn delete_admin_message(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let before = state.admin_messages.len();
        state.admin_messages.retain(|m| m.id != id);
        Ok(state.admin_messages.len() < before)
    }

    async fn visible_admin_messages(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<AdminMessage>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .admin_messages
            .iter()
            .rev()
            .filter(|m| m.is_visible(now) && m.is_addressed_to(user_id))
            .cloned()
            .collect())
    }

    async fn count_admin_messages(&self) -> Result<u64, AppError> {
        let state = self.state.read().await;
        Ok(state.admin_messages.len() as u64)
    }
}
