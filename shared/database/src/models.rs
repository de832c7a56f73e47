use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use skillswap_common::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub name: String,
    pub location: Option<String>,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
    pub offered_skills: Vec<String>,
    pub wanted_skills: Vec<String>,
    pub availability: Availability,
    pub visibility: ProfileVisibility,
    pub is_admin: bool,
    pub is_banned: bool,
    pub rating: f64,
    pub review_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_public(&self) -> bool {
        self.visibility == ProfileVisibility::Public
    }

    /// Whether other members may find this user when browsing or matching.
    pub fn is_discoverable(&self, include_private: bool) -> bool {
        !self.is_banned && (include_private || self.is_public())
    }

    pub fn skills(&self, list: SkillList) -> &Vec<String> {
        match list {
            SkillList::Offered => &self.offered_skills,
            SkillList::Wanted => &self.wanted_skills,
        }
    }

    pub fn skills_mut(&mut self, list: SkillList) -> &mut Vec<String> {
        match list {
            SkillList::Offered => &mut self.offered_skills,
            SkillList::Wanted => &mut self.wanted_skills,
        }
    }

    pub fn offers(&self, skill: &str) -> bool {
        self.offered_skills.iter().any(|s| s == skill)
    }

    /// `offered(other) ∩ wanted(self) ≠ ∅ OR wanted(other) ∩ offered(self) ≠ ∅`
    pub fn complements(&self, other: &User) -> bool {
        let intersects = |a: &[String], b: &[String]| a.iter().any(|s| b.contains(s));
        intersects(&other.offered_skills, &self.wanted_skills)
            || intersects(&other.wanted_skills, &self.offered_skills)
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub location: Option<String>,
    pub availability: Availability,
    pub visibility: ProfileVisibility,
    pub offered_skills: Vec<String>,
    pub wanted_skills: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UserSearch {
    /// Case-insensitive substring of the name or any skill.
    pub text: Option<String>,
    /// Case-insensitive exact skill name in either list.
    pub skill: Option<String>,
    pub availability: Option<Availability>,
    /// Case-insensitive substring of the location.
    pub location: Option<String>,
    pub exclude: Option<Uuid>,
    pub include_private: bool,
    pub include_banned: bool,
}

impl UserSearch {
    pub fn matches(&self, user: &User) -> bool {
        if self.exclude == Some(user.id) {
            return false;
        }
        if user.is_banned && !self.include_banned {
            return false;
        }
        if !user.is_public() && !self.include_private {
            return false;
        }
        if let Some(availability) = self.availability {
            if user.availability != availability {
                return false;
            }
        }
        if let Some(location) = &self.location {
            let needle = location.to_lowercase();
            let found = user
                .location
                .as_ref()
                .map(|l| l.to_lowercase().contains(&needle))
                .unwrap_or(false);
            if !found {
                return false;
            }
        }
        let mut all_skills = user.offered_skills.iter().chain(user.wanted_skills.iter());
        if let Some(skill) = &self.skill {
            let needle = skill.to_lowercase();
            if !all_skills.clone().any(|s| s.to_lowercase() == needle) {
                return false;
            }
        }
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            if !user.name.to_lowercase().contains(&needle)
                && !all_skills.any(|s| s.to_lowercase().contains(&needle))
            {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserStats {
    pub total: u64,
    pub public: u64,
    pub banned: u64,
    pub admins: u64,
}

/// The two sides of a swap. Also names the feedback slot each side fills.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Participant {
    Requester,
    Recipient,
}

impl Participant {
    pub fn other(&self) -> Participant {
        match self {
            Participant::Requester => Participant::Recipient,
            Participant::Recipient => Participant::Requester,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub rating: u8,
    pub comment: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwapFeedback {
    /// Left by the requester about the recipient.
    pub requester: Option<FeedbackEntry>,
    /// Left by the recipient about the requester.
    pub recipient: Option<FeedbackEntry>,
}

impl SwapFeedback {
    pub fn slot(&self, author: Participant) -> Option<&FeedbackEntry> {
        match author {
            Participant::Requester => self.requester.as_ref(),
            Participant::Recipient => self.recipient.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, author: Participant) -> &mut Option<FeedbackEntry> {
        match author {
            Participant::Requester => &mut self.requester,
            Participant::Recipient => &mut self.recipient,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.requester.is_some() && self.recipient.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub recipient_id: Uuid,
    pub offered_skill: String,
    pub wanted_skill: String,
    pub message: String,
    pub status: SwapStatus,
    pub feedback: SwapFeedback,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SwapRequest {
    pub fn participant(&self, user_id: Uuid) -> Option<Participant> {
        if user_id == self.requester_id {
            Some(Participant::Requester)
        } else if user_id == self.recipient_id {
            Some(Participant::Recipient)
        } else {
            None
        }
    }

    pub fn user_id_of(&self, participant: Participant) -> Uuid {
        match participant {
            Participant::Requester => self.requester_id,
            Participant::Recipient => self.recipient_id,
        }
    }

    pub fn involves_pair(&self, a: Uuid, b: Uuid) -> bool {
        (self.requester_id == a && self.recipient_id == b)
            || (self.requester_id == b && self.recipient_id == a)
    }
}

#[derive(Debug, Clone)]
pub struct NewSwapRequest {
    pub requester_id: Uuid,
    pub recipient_id: Uuid,
    pub offered_skill: String,
    pub wanted_skill: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct SwapFilter {
    pub user_id: Option<Uuid>,
    pub direction: SwapDirection,
    pub status: Option<SwapStatus>,
}

impl SwapFilter {
    pub fn matches(&self, swap: &SwapRequest) -> bool {
        if let Some(status) = self.status {
            if swap.status != status {
                return false;
            }
        }
        match (self.user_id, self.direction) {
            (None, _) => true,
            (Some(user), SwapDirection::Sent) => swap.requester_id == user,
            (Some(user), SwapDirection::Received) => swap.recipient_id == user,
            (Some(user), SwapDirection::All) => swap.participant(user).is_some(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SwapStatusCounts {
    pub pending: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub completed: u64,
    pub cancelled: u64,
    pub total: u64,
}

impl SwapStatusCounts {
    pub fn add(&mut self, status: SwapStatus, count: u64) {
        match status {
            SwapStatus::Pending => self.pending += count,
            SwapStatus::Accepted => self.accepted += count,
            SwapStatus::Rejected => self.rejected += count,
            SwapStatus::Completed => self.completed += count,
            SwapStatus::Cancelled => self.cancelled += count,
        }
        self.total += count;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub related: Option<RelatedEntity>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub related: Option<RelatedEntity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminMessage {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: AdminMessageKind,
    pub is_active: bool,
    pub is_global: bool,
    pub target_user_ids: Vec<Uuid>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdminMessage {
    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.map_or(true, |expiry| expiry > now)
    }

    pub fn is_addressed_to(&self, user_id: Uuid) -> bool {
        self.is_global || self.target_user_ids.contains(&user_id)
    }
}

#[derive(Debug, Clone)]
pub struct NewAdminMessage {
    pub title: String,
    pub message: String,
    pub kind: AdminMessageKind,
    pub is_active: bool,
    pub is_global: bool,
    pub target_user_ids: Vec<Uuid>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
}
