use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Postgres, QueryBuilder};
use uuid::Uuid;

use skillswap_common::{AppError, Page, PageRequest, RelatedEntity, SwapDirection, SwapStatus};

use crate::connection::DbPool;
use crate::models::*;
use crate::store::*;

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    name: String,
    location: Option<String>,
    photo_url: Option<String>,
    bio: Option<String>,
    offered_skills: Vec<String>,
    wanted_skills: Vec<String>,
    availability: String,
    visibility: String,
    is_admin: bool,
    is_banned: bool,
    rating: f64,
    review_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            name: row.name,
            location: row.location,
            photo_url: row.photo_url,
            bio: row.bio,
            offered_skills: row.offered_skills,
            wanted_skills: row.wanted_skills,
            availability: row.availability.parse()?,
            visibility: row.visibility.parse()?,
            is_admin: row.is_admin,
            is_banned: row.is_banned,
            rating: row.rating,
            review_count: row.review_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct SwapRow {
    id: Uuid,
    requester_id: Uuid,
    recipient_id: Uuid,
    offered_skill: String,
    wanted_skill: String,
    message: String,
    status: String,
    requester_rating: Option<i16>,
    requester_comment: Option<String>,
    requester_feedback_at: Option<DateTime<Utc>>,
    recipient_rating: Option<i16>,
    recipient_comment: Option<String>,
    recipient_feedback_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

fn feedback_entry(
    rating: Option<i16>,
    comment: Option<String>,
    submitted_at: Option<DateTime<Utc>>,
) -> Result<Option<FeedbackEntry>, AppError> {
    match (rating, submitted_at) {
        (Some(rating), Some(submitted_at)) => Ok(Some(FeedbackEntry {
            rating: u8::try_from(rating)
                .map_err(|_| AppError::Internal(format!("Stored rating out of range: {}", rating)))?,
            comment,
            submitted_at,
        })),
        _ => Ok(None),
    }
}

impl TryFrom<SwapRow> for SwapRequest {
    type Error = AppError;

    fn try_from(row: SwapRow) -> Result<Self, Self::Error> {
        Ok(SwapRequest {
            id: row.id,
            requester_id: row.requester_id,
            recipient_id: row.recipient_id,
            offered_skill: row.offered_skill,
            wanted_skill: row.wanted_skill,
            message: row.message,
            status: row.status.parse()?,
            feedback: SwapFeedback {
                requester: feedback_entry(
                    row.requester_rating,
                    row.requester_comment,
                    row.requester_feedback_at,
                )?,
                recipient: feedback_entry(
                    row.recipient_rating,
                    row.recipient_comment,
                    row.recipient_feedback_at,
                )?,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
            completed_at: row.completed_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    kind: String,
    title: String,
    message: String,
    is_read: bool,
    related_kind: Option<String>,
    related_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = AppError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Notification {
            id: row.id,
            user_id: row.user_id,
            kind: row.kind.parse()?,
            title: row.title,
            message: row.message,
            is_read: row.is_read,
            related: RelatedEntity::from_parts(row.related_kind.as_deref(), row.related_id)?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct AdminMessageRow {
    id: Uuid,
    title: String,
    message: String,
    kind: String,
    is_active: bool,
    is_global: bool,
    target_user_ids: Vec<Uuid>,
    expires_at: Option<DateTime<Utc>>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AdminMessageRow> for AdminMessage {
    type Error = AppError;

    fn try_from(row: AdminMessageRow) -> Result<Self, Self::Error> {
        Ok(AdminMessage {
            id: row.id,
            title: row.title,
            message: row.message,
            kind: row.kind.parse()?,
            is_active: row.is_active,
            is_global: row.is_global,
            target_user_ids: row.target_user_ids,
            expires_at: row.expires_at,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, AppError>
where
    T: TryFrom<R, Error = AppError>,
{
    rows.into_iter().map(T::try_from).collect()
}

fn convert_opt<R, T>(row: Option<R>) -> Result<Option<T>, AppError>
where
    T: TryFrom<R, Error = AppError>,
{
    row.map(T::try_from).transpose()
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Escapes LIKE wildcards so user input only ever matches literally.
fn like_pattern(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_user_filters(qb: &mut QueryBuilder<'_, Postgres>, search: &UserSearch) {
    if let Some(exclude) = search.exclude {
        qb.push(" AND id <> ").push_bind(exclude);
    }
    if !search.include_banned {
        qb.push(" AND NOT is_banned");
    }
    if !search.include_private {
        qb.push(" AND visibility = 'public'");
    }
    if let Some(availability) = search.availability {
        qb.push(" AND availability = ")
            .push_bind(availability.as_str().to_string());
    }
    if let Some(location) = &search.location {
        qb.push(" AND location ILIKE ").push_bind(like_pattern(location));
    }
    if let Some(skill) = &search.skill {
        qb.push(" AND EXISTS (SELECT 1 FROM unnest(offered_skills || wanted_skills) AS s WHERE lower(s) = lower(")
            .push_bind(skill.clone())
            .push("))");
    }
    if let Some(text) = &search.text {
        let pattern = like_pattern(text);
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR EXISTS (SELECT 1 FROM unnest(offered_skills || wanted_skills) AS s WHERE s ILIKE ")
            .push_bind(pattern)
            .push("))");
    }
}

fn push_swap_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &SwapFilter) {
    if let Some(user) = filter.user_id {
        match filter.direction {
            SwapDirection::Sent => {
                qb.push(" AND requester_id = ").push_bind(user);
            }
            SwapDirection::Received => {
                qb.push(" AND recipient_id = ").push_bind(user);
            }
            SwapDirection::All => {
                qb.push(" AND (requester_id = ")
                    .push_bind(user)
                    .push(" OR recipient_id = ")
                    .push_bind(user)
                    .push(")");
            }
        }
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str().to_string());
    }
}

fn push_page(qb: &mut QueryBuilder<'_, Postgres>, page: PageRequest) {
    qb.push(" LIMIT ")
        .push_bind(i64::from(page.limit))
        .push(" OFFSET ")
        .push_bind(page.offset() as i64);
}

/// PostgreSQL-backed store. Every state change is a single conditional
/// statement so concurrent requests cannot interleave check and write.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, email, password_hash, name, location, availability, visibility,
                               offered_skills, wanted_skills)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.location)
        .bind(user.availability.as_str())
        .bind(user.visibility.as_str())
        .bind(&user.offered_skills)
        .bind(&user.wanted_skills)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AppError::Conflict("An account with this email already exists".to_string())
            } else {
                AppError::Database(err)
            }
        })?;

        row.try_into()
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        convert_opt(row)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        convert_opt(row)
    }

    async fn update_profile(&self, user: &User) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET name = $2, location = $3, photo_url = $4, bio = $5,
                offered_skills = $6, wanted_skills = $7, availability = $8, visibility = $9,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.location)
        .bind(&user.photo_url)
        .bind(&user.bio)
        .bind(&user.offered_skills)
        .bind(&user.wanted_skills)
        .bind(user.availability.as_str())
        .bind(user.visibility.as_str())
        .fetch_optional(&self.pool)
        .await?;
        convert_opt(row)
    }

    async fn set_banned(&self, id: Uuid, banned: bool) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users SET is_banned = $2, updated_at = now()
            WHERE id = $1 AND (NOT $2 OR NOT is_admin)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(banned)
        .fetch_optional(&self.pool)
        .await?;
        convert_opt(row)
    }

    async fn set_admin(&self, id: Uuid, admin: bool) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            "UPDATE users SET is_admin = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(admin)
        .fetch_optional(&self.pool)
        .await?;
        convert_opt(row)
    }

    async fn apply_rating(&self, id: Uuid, rating: u8) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET rating = (rating * review_count + $2) / (review_count + 1),
                review_count = review_count + 1,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(f64::from(rating))
        .fetch_optional(&self.pool)
        .await?;
        convert_opt(row)
    }

    async fn search_users(&self, search: &UserSearch, page: PageRequest) -> Result<Page<User>, AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users WHERE TRUE");
        push_user_filters(&mut count, search);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM users WHERE TRUE");
        push_user_filters(&mut select, search);
        select.push(" ORDER BY created_at DESC, id");
        push_page(&mut select, page);
        let rows: Vec<UserRow> = select.build_query_as().fetch_all(&self.pool).await?;

        Ok(Page::new(convert_all(rows)?, page, total.max(0) as u64))
    }

    async fn find_skill_matches(
        &self,
        user: &User,
        include_private: bool,
        page: PageRequest,
    ) -> Result<Page<User>, AppError> {
        let push_match_filters = |qb: &mut QueryBuilder<'_, Postgres>| {
            qb.push(" AND id <> ")
                .push_bind(user.id)
                .push(" AND NOT is_banned");
            if !include_private {
                qb.push(" AND visibility = 'public'");
            }
            qb.push(" AND (offered_skills && ")
                .push_bind(user.wanted_skills.clone())
                .push(" OR wanted_skills && ")
                .push_bind(user.offered_skills.clone())
                .push(")");
        };

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users WHERE TRUE");
        push_match_filters(&mut count);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM users WHERE TRUE");
        push_match_filters(&mut select);
        select.push(" ORDER BY rating DESC, review_count DESC, created_at ASC, id ASC");
        push_page(&mut select, page);
        let rows: Vec<UserRow> = select.build_query_as().fetch_all(&self.pool).await?;

        Ok(Page::new(convert_all(rows)?, page, total.max(0) as u64))
    }

    async fn active_user_ids(&self) -> Result<Vec<Uuid>, AppError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM users WHERE NOT is_banned ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn user_stats(&self) -> Result<UserStats, AppError> {
        let (total, public, banned, admins) = sqlx::query_as::<_, (i64, i64, i64, i64)>(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE visibility = 'public' AND NOT is_banned),
                   COUNT(*) FILTER (WHERE is_banned),
                   COUNT(*) FILTER (WHERE is_admin)
            FROM users
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(UserStats {
            total: total.max(0) as u64,
            public: public.max(0) as u64,
            banned: banned.max(0) as u64,
            admins: admins.max(0) as u64,
        })
    }
}

#[async_trait]
impl SwapStore for PgStore {
    async fn insert_swap(&self, swap: NewSwapRequest) -> Result<SwapRequest, AppError> {
        let row = sqlx::query_as::<_, SwapRow>(
            r#"
            INSERT INTO swap_requests (id, requester_id, recipient_id, offered_skill, wanted_skill, message)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(swap.requester_id)
        .bind(swap.recipient_id)
        .bind(&swap.offered_skill)
        .bind(&swap.wanted_skill)
        .bind(&swap.message)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AppError::Conflict(
                    "A pending swap request already exists between these users".to_string(),
                )
            } else {
                AppError::Database(err)
            }
        })?;

        row.try_into()
    }

    async fn find_swap(&self, id: Uuid) -> Result<Option<SwapRequest>, AppError> {
        let row = sqlx::query_as::<_, SwapRow>("SELECT * FROM swap_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        convert_opt(row)
    }

    async fn find_pending_between(&self, a: Uuid, b: Uuid) -> Result<Option<SwapRequest>, AppError> {
        let row = sqlx::query_as::<_, SwapRow>(
            r#"
            SELECT * FROM swap_requests
            WHERE status = 'pending'
              AND ((requester_id = $1 AND recipient_id = $2) OR (requester_id = $2 AND recipient_id = $1))
            LIMIT 1
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_optional(&self.pool)
        .await?;
        convert_opt(row)
    }

    async fn transition_swap(
        &self,
        id: Uuid,
        from: SwapStatus,
        to: SwapStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<SwapRequest>, AppError> {
        let completed_at = (to == SwapStatus::Completed).then_some(at);
        let row = sqlx::query_as::<_, SwapRow>(
            r#"
            UPDATE swap_requests
            SET status = $3, updated_at = $4, completed_at = COALESCE($5, completed_at)
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(at)
        .bind(completed_at)
        .fetch_optional(&self.pool)
        .await?;
        convert_opt(row)
    }

    async fn record_feedback(
        &self,
        id: Uuid,
        author: Participant,
        entry: FeedbackEntry,
    ) -> Result<Option<SwapRequest>, AppError> {
        let sql = match author {
            Participant::Requester => {
                r#"
                UPDATE swap_requests
                SET requester_rating = $2, requester_comment = $3, requester_feedback_at = $4, updated_at = $4
                WHERE id = $1 AND status = 'completed' AND requester_rating IS NULL
                RETURNING *
                "#
            }
            Participant::Recipient => {
                r#"
                UPDATE swap_requests
                SET recipient_rating = $2, recipient_comment = $3, recipient_feedback_at = $4, updated_at = $4
                WHERE id = $1 AND status = 'completed' AND recipient_rating IS NULL
                RETURNING *
                "#
            }
        };

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, SwapRow>(sql)
            .bind(id)
            .bind(i16::from(entry.rating))
            .bind(&entry.comment)
            .bind(entry.submitted_at)
            .fetch_optional(&mut *tx)
            .await?;
        // Dropping the transaction rolls back
        let Some(row) = row else {
            return Ok(None);
        };
        let swap = SwapRequest::try_from(row)?;

        sqlx::query(
            r#"
            UPDATE users
            SET rating = (rating * review_count + $2) / (review_count + 1),
                review_count = review_count + 1,
                updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(swap.user_id_of(author.other()))
        .bind(f64::from(entry.rating))
        .bind(entry.submitted_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(swap))
    }

    async fn list_swaps(&self, filter: &SwapFilter, page: PageRequest) -> Result<Page<SwapRequest>, AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM swap_requests WHERE TRUE");
        push_swap_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM swap_requests WHERE TRUE");
        push_swap_filters(&mut select, filter);
        select.push(" ORDER BY created_at DESC, id");
        push_page(&mut select, page);
        let rows: Vec<SwapRow> = select.build_query_as().fetch_all(&self.pool).await?;

        Ok(Page::new(convert_all(rows)?, page, total.max(0) as u64))
    }

    async fn swap_status_counts(&self, user_id: Option<Uuid>) -> Result<SwapStatusCounts, AppError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT status, COUNT(*) FROM swap_requests
            WHERE $1::uuid IS NULL OR requester_id = $1 OR recipient_id = $1
            GROUP BY status
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut counts = SwapStatusCounts::default();
        for (status, count) in rows {
            counts.add(status.parse()?, count.max(0) as u64);
        }
        Ok(counts)
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, AppError> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            INSERT INTO notifications (id, user_id, kind, title, message, related_kind, related_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(notification.user_id)
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.related.map(|r| r.kind()))
        .bind(notification.related.map(|r| r.id()))
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: PageRequest,
    ) -> Result<Page<Notification>, AppError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND (NOT $2 OR NOT is_read)",
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT * FROM notifications
            WHERE user_id = $1 AND (NOT $2 OR NOT is_read)
            ORDER BY created_at DESC, id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(i64::from(page.limit))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(convert_all(rows)?, page, total.max(0) as u64))
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<u64, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.max(0) as u64)
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_notification(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AdminMessageStore for PgStore {
    async fn insert_admin_message(&self, message: NewAdminMessage) -> Result<AdminMessage, AppError> {
        let row = sqlx::query_as::<_, AdminMessageRow>(
            r#"
            INSERT INTO admin_messages (id, title, message, kind, is_active, is_global,
                                        target_user_ids, expires_at, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&message.title)
        .bind(&message.message)
        .bind(message.kind.as_str())
        .bind(message.is_active)
        .bind(message.is_global)
        .bind(&message.target_user_ids)
        .bind(message.expires_at)
        .bind(message.created_by)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find_admin_message(&self, id: Uuid) -> Result<Option<AdminMessage>, AppError> {
        let row = sqlx::query_as::<_, AdminMessageRow>("SELECT * FROM admin_messages WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        convert_opt(row)
    }

    async fn list_admin_messages(&self, page: PageRequest) -> Result<Page<AdminMessage>, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin_messages")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, AdminMessageRow>(
            "SELECT * FROM admin_messages ORDER BY created_at DESC, id LIMIT $1 OFFSET $2",
        )
        .bind(i64::from(page.limit))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(convert_all(rows)?, page, total.max(0) as u64))
    }

    async fn update_admin_message(&self, message: &AdminMessage) -> Result<Option<AdminMessage>, AppError> {
        let row = sqlx::query_as::<_, AdminMessageRow>(
            r#"
            UPDATE admin_messages
            SET title = $2, message = $3, kind = $4, is_active = $5, expires_at = $6, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(message.id)
        .bind(&message.title)
        .bind(&message.message)
        .bind(message.kind.as_str())
        .bind(message.is_active)
        .bind(message.expires_at)
        .fetch_optional(&self.pool)
        .await?;
        convert_opt(row)
    }

    async fn delete_admin_message(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM admin_messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn visible_admin_messages(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<AdminMessage>, AppError> {
        let rows = sqlx::query_as::<_, AdminMessageRow>(
            r#"
            SELECT * FROM admin_messages
            WHERE is_active
              AND (expires_at IS NULL OR expires_at > $2)
              AND (is_global OR $1 = ANY(target_user_ids))
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(user_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn count_admin_messages(&self) -> Result<u64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin_messages")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}
