use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use skillswap_common::{
    AdminMessageKind, Availability, ProfileVisibility, SwapDirection, SwapStatus,
};
use skillswap_database::{AdminMessage, SwapRequest, SwapStatusCounts, User, UserStats};

// Request/Response DTOs
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub password: String,

    #[validate(length(max = 100))]
    pub location: Option<String>,

    pub availability: Option<Availability>,
    pub visibility: Option<ProfileVisibility>,

    #[serde(default)]
    pub offered_skills: Vec<String>,
    #[serde(default)]
    pub wanted_skills: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 100))]
    pub location: Option<String>,

    #[validate(url(message = "Photo must be a valid URL"))]
    pub photo_url: Option<String>,

    #[validate(length(max = 500))]
    pub bio: Option<String>,

    pub availability: Option<Availability>,
    pub visibility: Option<ProfileVisibility>,
    pub offered_skills: Option<Vec<String>>,
    pub wanted_skills: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SkillRequest {
    #[validate(length(min = 1, max = 50, message = "Skill must be 1-50 characters"))]
    pub skill: String,
}

/// What other members see of a profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicProfile {
    pub id: Uuid,
    pub name: String,
    pub location: Option<String>,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
    pub offered_skills: Vec<String>,
    pub wanted_skills: Vec<String>,
    pub availability: Availability,
    pub rating: f64,
    pub review_count: i32,
    pub joined_at: DateTime<Utc>,
}

impl From<User> for PublicProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            location: user.location,
            photo_url: user.photo_url,
            bio: user.bio,
            offered_skills: user.offered_skills,
            wanted_skills: user.wanted_skills,
            availability: user.availability,
            rating: user.rating,
            review_count: user.review_count,
            joined_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ProfileView {
    Full(User),
    Public(PublicProfile),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillMatch {
    pub profile: PublicProfile,
    /// Skills they offer that you want.
    pub can_teach_you: Vec<String>,
    /// Skills you offer that they want.
    pub wants_from_you: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    /// Free text matched against names and skills.
    pub q: Option<String>,
    pub skill: Option<String>,
    pub availability: Option<Availability>,
    pub location: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateSwapRequest {
    pub recipient_id: Uuid,

    #[validate(length(min = 1, max = 50, message = "Offered skill must be 1-50 characters"))]
    pub offered_skill: String,

    #[validate(length(min = 1, max = 50, message = "Wanted skill must be 1-50 characters"))]
    pub wanted_skill: String,

    #[validate(length(max = 500, message = "Message must be at most 500 characters"))]
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SwapQuery {
    pub status: Option<SwapStatus>,
    pub direction: Option<SwapDirection>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminSwapQuery {
    pub status: Option<SwapStatus>,
    pub user_id: Option<Uuid>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct FeedbackRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: u8,

    #[validate(length(max = 200, message = "Comment must be at most 200 characters"))]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub swap: SwapRequest,
    /// Both participants have now left feedback.
    pub feedback_complete: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetAdminRequest {
    pub is_admin: bool,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateAdminMessageRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 1000, message = "Message must be 1-1000 characters"))]
    pub message: String,

    #[serde(default)]
    pub kind: AdminMessageKind,

    #[serde(default = "default_true")]
    pub is_global: bool,

    #[serde(default)]
    pub target_user_ids: Vec<Uuid>,

    #[serde(default = "default_true")]
    pub is_active: bool,

    pub expires_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct UpdateAdminMessageRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 1000, message = "Message must be 1-1000 characters"))]
    pub message: Option<String>,

    pub kind: Option<AdminMessageKind>,
    pub is_active: Option<bool>,

    /// Absent leaves the expiry alone; `null` clears it.
    #[serde(default, deserialize_with = "present")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

/// Maps a present field, `null` included, to `Some`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminMessageCreated {
    pub message: AdminMessage,
    /// Notifications persisted for the recipients.
    pub delivered: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardStats {
    pub users: UserStats,
    pub swaps: SwapStatusCounts,
    pub admin_messages: u64,
    pub online_users: usize,
}
