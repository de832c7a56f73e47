use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use skillswap_common::{AppError, Page, PageRequest, SwapStatus};

use crate::models::*;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the email is already registered.
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Overwrites the profile fields (name, location, photo, bio, skills,
    /// availability, visibility) from `user`. Flags and rating are untouched.
    async fn update_profile(&self, user: &User) -> Result<Option<User>, AppError>;

    /// Returns `None` when the user is missing, or when asked to ban an admin.
    async fn set_banned(&self, id: Uuid, banned: bool) -> Result<Option<User>, AppError>;

    async fn set_admin(&self, id: Uuid, admin: bool) -> Result<Option<User>, AppError>;

    /// Folds `rating` into the user's running mean in one atomic step.
    async fn apply_rating(&self, id: Uuid, rating: u8) -> Result<Option<User>, AppError>;

    async fn search_users(&self, search: &UserSearch, page: PageRequest) -> Result<Page<User>, AppError>;

    /// Discoverable users whose skills complement `user`'s, most reputable first.
    async fn find_skill_matches(
        &self,
        user: &User,
        include_private: bool,
        page: PageRequest,
    ) -> Result<Page<User>, AppError>;

    /// Ids of every non-banned user, oldest account first.
    async fn active_user_ids(&self) -> Result<Vec<Uuid>, AppError>;

    async fn user_stats(&self) -> Result<UserStats, AppError>;
}

#[async_trait]
pub trait SwapStore: Send + Sync {
    /// Fails with `Conflict` when a pending swap already links the pair.
    async fn insert_swap(&self, swap: NewSwapRequest) -> Result<SwapRequest, AppError>;

    async fn find_swap(&self, id: Uuid) -> Result<Option<SwapRequest>, AppError>;

    /// The pending swap between `a` and `b` in either direction, if any.
    async fn find_pending_between(&self, a: Uuid, b: Uuid) -> Result<Option<SwapRequest>, AppError>;

    /// Moves the swap from `from` to `to` only if it is still in `from`.
    /// Returns `None` when the swap is missing or its status moved on.
    async fn transition_swap(
        &self,
        id: Uuid,
        from: SwapStatus,
        to: SwapStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<SwapRequest>, AppError>;

    /// Fills `author`'s feedback slot only if the swap is completed and the
    /// slot is still empty, and folds the rating into the partner's mean in
    /// the same atomic step. Returns `None` when nothing was written.
    async fn record_feedback(
        &self,
        id: Uuid,
        author: Participant,
        entry: FeedbackEntry,
    ) -> Result<Option<SwapRequest>, AppError>;

    async fn list_swaps(&self, filter: &SwapFilter, page: PageRequest) -> Result<Page<SwapRequest>, AppError>;

    async fn swap_status_counts(&self, user_id: Option<Uuid>) -> Result<SwapStatusCounts, AppError>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, AppError>;

    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: PageRequest,
    ) -> Result<Page<Notification>, AppError>;

    async fn unread_count(&self, user_id: Uuid) -> Result<u64, AppError>;

    /// `false` when no notification with that id belongs to the user.
    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError>;

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, AppError>;

    async fn delete_notification(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait AdminMessageStore: Send + Sync {
    async fn insert_admin_message(&self, message: NewAdminMessage) -> Result<AdminMessage, AppError>;

    async fn find_admin_message(&self, id: Uuid) -> Result<Option<AdminMessage>, AppError>;

    async fn list_admin_messages(&self, page: PageRequest) -> Result<Page<AdminMessage>, AppError>;

    /// Overwrites title, message, kind, active flag and expiry.
    async fn update_admin_message(&self, message: &AdminMessage) -> Result<Option<AdminMessage>, AppError>;

    async fn delete_admin_message(&self, id: Uuid) -> Result<bool, AppError>;

    /// Active, unexpired messages that are global or target `user_id`.
    async fn visible_admin_messages(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<AdminMessage>, AppError>;

    async fn count_admin_messages(&self) -> Result<u64, AppError>;
}

/// Everything the marketplace service persists.
pub trait MarketplaceStore: UserStore + SwapStore + NotificationStore + AdminMessageStore {}

impl<T> MarketplaceStore for T where T: UserStore + SwapStore + NotificationStore + AdminMessageStore {}
