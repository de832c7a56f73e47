use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Weekdays,
    Weekends,
    Evenings,
    #[default]
    Flexible,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Weekdays => "weekdays",
            Availability::Weekends => "weekends",
            Availability::Evenings => "evenings",
            Availability::Flexible => "flexible",
        }
    }
}

impl FromStr for Availability {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "weekdays" => Ok(Availability::Weekdays),
            "weekends" => Ok(Availability::Weekends),
            "evenings" => Ok(Availability::Evenings),
            "flexible" => Ok(Availability::Flexible),
            other => Err(AppError::Internal(format!("Unknown availability: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProfileVisibility {
    #[default]
    Public,
    Private,
}

impl ProfileVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileVisibility::Public => "public",
            ProfileVisibility::Private => "private",
        }
    }
}

impl FromStr for ProfileVisibility {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "public" => Ok(ProfileVisibility::Public),
            "private" => Ok(ProfileVisibility::Private),
            other => Err(AppError::Internal(format!("Unknown visibility: {}", other))),
        }
    }
}

/// Which of a user's two skill lists an edit applies to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkillList {
    Offered,
    Wanted,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SwapStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
    Cancelled,
}

impl SwapStatus {
    pub const ALL: [SwapStatus; 5] = [
        SwapStatus::Pending,
        SwapStatus::Accepted,
        SwapStatus::Rejected,
        SwapStatus::Completed,
        SwapStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SwapStatus::Pending => "pending",
            SwapStatus::Accepted => "accepted",
            SwapStatus::Rejected => "rejected",
            SwapStatus::Completed => "completed",
            SwapStatus::Cancelled => "cancelled",
        }
    }

    /// Rejected, completed and cancelled swaps never change status again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SwapStatus::Rejected | SwapStatus::Completed | SwapStatus::Cancelled
        )
    }
}

impl fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwapStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        SwapStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| AppError::Internal(format!("Unknown swap status: {}", value)))
    }
}

/// Filter for listing a user's swaps relative to their role in them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SwapDirection {
    Sent,
    Received,
    #[default]
    All,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    SwapRequest,
    SwapAccepted,
    SwapRejected,
    SwapCompleted,
    AdminMessage,
    FeedbackReceived,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::SwapRequest => "swap_request",
            NotificationKind::SwapAccepted => "swap_accepted",
            NotificationKind::SwapRejected => "swap_rejected",
            NotificationKind::SwapCompleted => "swap_completed",
            NotificationKind::AdminMessage => "admin_message",
            NotificationKind::FeedbackReceived => "feedback_received",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "swap_request" => Ok(NotificationKind::SwapRequest),
            "swap_accepted" => Ok(NotificationKind::SwapAccepted),
            "swap_rejected" => Ok(NotificationKind::SwapRejected),
            "swap_completed" => Ok(NotificationKind::SwapCompleted),
            "admin_message" => Ok(NotificationKind::AdminMessage),
            "feedback_received" => Ok(NotificationKind::FeedbackReceived),
            other => Err(AppError::Internal(format!("Unknown notification kind: {}", other))),
        }
    }
}

/// The entity that caused a notification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum RelatedEntity {
    SwapRequest(Uuid),
    User(Uuid),
    AdminMessage(Uuid),
}

impl RelatedEntity {
    pub fn kind(&self) -> &'static str {
        match self {
            RelatedEntity::SwapRequest(_) => "swap_request",
            RelatedEntity::User(_) => "user",
            RelatedEntity::AdminMessage(_) => "admin_message",
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            RelatedEntity::SwapRequest(id)
            | RelatedEntity::User(id)
            | RelatedEntity::AdminMessage(id) => *id,
        }
    }

    /// Rebuilds the reference from its stored `(kind, id)` column pair.
    pub fn from_parts(kind: Option<&str>, id: Option<Uuid>) -> Result<Option<Self>, AppError> {
        match (kind, id) {
            (Some("swap_request"), Some(id)) => Ok(Some(RelatedEntity::SwapRequest(id))),
            (Some("user"), Some(id)) => Ok(Some(RelatedEntity::User(id))),
            (Some("admin_message"), Some(id)) => Ok(Some(RelatedEntity::AdminMessage(id))),
            (None, None) => Ok(None),
            (kind, id) => Err(AppError::Internal(format!(
                "Malformed related entity: kind={:?} id={:?}",
                kind, id
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AdminMessageKind {
    #[default]
    Info,
    Warning,
    Announcement,
    Maintenance,
}

impl AdminMessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminMessageKind::Info => "info",
            AdminMessageKind::Warning => "warning",
            AdminMessageKind::Announcement => "announcement",
            AdminMessageKind::Maintenance => "maintenance",
        }
    }
}

impl FromStr for AdminMessageKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "info" => Ok(AdminMessageKind::Info),
            "warning" => Ok(AdminMessageKind::Warning),
            "announcement" => Ok(AdminMessageKind::Announcement),
            "maintenance" => Ok(AdminMessageKind::Maintenance),
            other => Err(AppError::Internal(format!("Unknown admin message kind: {}", other))),
        }
    }
}

/// A single field-level validation failure reported to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// Common response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self::success_with_message("OK", data)
    }

    pub fn success_with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            errors: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            errors: None,
        }
    }

    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = Some(errors);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_related_entity_round_trips_through_columns() {
        let id = Uuid::new_v4();
        let related = RelatedEntity::SwapRequest(id);

        let rebuilt = RelatedEntity::from_parts(Some(related.kind()), Some(related.id())).unwrap();
        assert_eq!(rebuilt, Some(related));
        assert_eq!(RelatedEntity::from_parts(None, None).unwrap(), None);
        assert!(RelatedEntity::from_parts(Some("user"), None).is_err());
    }

    #[test]
    fn test_related_entity_serializes_as_tagged_union() {
        let id = Uuid::new_v4();
        let value = serde_json::to_value(RelatedEntity::AdminMessage(id)).unwrap();

        assert_eq!(value["kind"], "admin_message");
        assert_eq!(value["id"], id.to_string());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!SwapStatus::Pending.is_terminal());
        assert!(!SwapStatus::Accepted.is_terminal());
        assert!(SwapStatus::Rejected.is_terminal());
        assert!(SwapStatus::Completed.is_terminal());
        assert!(SwapStatus::Cancelled.is_terminal());
        assert_eq!("cancelled".parse::<SwapStatus>().unwrap(), SwapStatus::Cancelled);
    }

    #[test]
    fn test_error_envelope_omits_empty_fields() {
        let body = serde_json::to_value(ApiResponse::<()>::error("nope")).unwrap();

        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "nope");
        assert!(body.get("data").is_none());
        assert!(body.get("errors").is_none());
    }
}
