use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use skillswap_common::{
    AppError, FieldError, NotificationKind, Page, PageRequest, RelatedEntity, SwapDirection,
    SwapStatus,
};
use skillswap_database::{
    MarketplaceStore, NewSwapRequest, Participant, SwapFilter, SwapRequest, SwapStatusCounts, User,
};

use crate::models::*;
use crate::notifier::Notifier;
use crate::state::AppState;

/// Moves that change an existing swap's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapAction {
    Accept,
    Reject,
    Cancel,
    Complete,
}

impl SwapAction {
    pub fn verb(&self) -> &'static str {
        match self {
            SwapAction::Accept => "accept",
            SwapAction::Reject => "reject",
            SwapAction::Cancel => "cancel",
            SwapAction::Complete => "complete",
        }
    }

    /// `(required status, resulting status)`
    pub fn transition(&self) -> (SwapStatus, SwapStatus) {
        match self {
            SwapAction::Accept => (SwapStatus::Pending, SwapStatus::Accepted),
            SwapAction::Reject => (SwapStatus::Pending, SwapStatus::Rejected),
            SwapAction::Cancel => (SwapStatus::Pending, SwapStatus::Cancelled),
            SwapAction::Complete => (SwapStatus::Accepted, SwapStatus::Completed),
        }
    }

    pub fn permits(&self, actor: Participant) -> bool {
        match self {
            SwapAction::Accept | SwapAction::Reject => actor == Participant::Recipient,
            SwapAction::Cancel => actor == Participant::Requester,
            SwapAction::Complete => true,
        }
    }
}

/// Checks who may apply `action` to `swap` and from which status.
/// Returns the status the swap moves to. Authorization is decided before state.
pub fn check_transition(
    swap: &SwapRequest,
    actor: Uuid,
    action: SwapAction,
) -> Result<SwapStatus, AppError> {
    let participant = swap.participant(actor).ok_or_else(|| {
        AppError::Authorization("You are not a participant in this swap".to_string())
    })?;

    if !action.permits(participant) {
        let allowed = match participant.other() {
            Participant::Requester => "requester",
            Participant::Recipient => "recipient",
        };
        return Err(AppError::Authorization(format!(
            "Only the {} can {} this swap",
            allowed,
            action.verb()
        )));
    }

    let (from, to) = action.transition();
    if swap.status != from {
        return Err(AppError::InvalidState(format!(
            "Cannot {} a swap that is {}",
            action.verb(),
            swap.status
        )));
    }

    Ok(to)
}

pub struct SwapService {
    store: Arc<dyn MarketplaceStore>,
    notifier: Notifier,
}

impl SwapService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            notifier: state.notifier.clone(),
        }
    }

    pub async fn create(&self, requester: &User, request: CreateSwapRequest) -> Result<SwapRequest, AppError> {
        if request.recipient_id == requester.id {
            return Err(AppError::Validation(
                "You cannot request a swap with yourself".to_string(),
            ));
        }

        let recipient = self
            .store
            .find_user(request.recipient_id)
            .await?
            .filter(|user| !user.is_banned)
            .ok_or_else(|| AppError::NotFound("Recipient not found".to_string()))?;

        let offered_skill = request.offered_skill.trim().to_string();
        let wanted_skill = request.wanted_skill.trim().to_string();

        let mut problems = Vec::new();
        if !requester.offers(&offered_skill) {
            problems.push(FieldError::new(
                "offered_skill",
                "You can only offer a skill from your own offered list",
            ));
        }
        if !recipient.offers(&wanted_skill) {
            problems.push(FieldError::new(
                "wanted_skill",
                "The recipient does not offer this skill",
            ));
        }
        if !problems.is_empty() {
            return Err(AppError::InvalidFields(problems));
        }

        if self
            .store
            .find_pending_between(requester.id, recipient.id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "A pending swap request already exists between these users".to_string(),
            ));
        }

        let swap = self
            .store
            .insert_swap(NewSwapRequest {
                requester_id: requester.id,
                recipient_id: recipient.id,
                offered_skill,
                wanted_skill,
                message: request.message.map(|m| m.trim().to_string()).unwrap_or_default(),
            })
            .await?;

        tracing::info!(
            swap_id = %swap.id,
            requester = %swap.requester_id,
            recipient = %swap.recipient_id,
            "Swap requested"
        );

        self.notifier
            .notify_user(
                recipient.id,
                NotificationKind::SwapRequest,
                "New swap request",
                format!(
                    "{} wants to swap {} for your {}",
                    requester.name, swap.offered_skill, swap.wanted_skill
                ),
                Some(RelatedEntity::SwapRequest(swap.id)),
            )
            .await;

        Ok(swap)
    }

    /// Participants and admins may read a swap.
    pub async fn get(&self, viewer: &User, swap_id: Uuid) -> Result<SwapRequest, AppError> {
        let swap = self.load(swap_id).await?;
        if swap.participant(viewer.id).is_none() && !viewer.is_admin {
            return Err(AppError::Authorization(
                "You are not a participant in this swap".to_string(),
            ));
        }
        Ok(swap)
    }

    pub async fn apply(&self, actor: &User, swap_id: Uuid, action: SwapAction) -> Result<SwapRequest, AppError> {
        let swap = self.load(swap_id).await?;
        let next = check_transition(&swap, actor.id, action)?;

        // Lost races show up as a missing row
        let updated = self
            .store
            .transition_swap(swap.id, swap.status, next, Utc::now())
            .await?
            .ok_or_else(|| {
                AppError::InvalidState("The swap was modified concurrently; reload and retry".to_string())
            })?;

        tracing::info!(
            swap_id = %updated.id,
            actor = %actor.id,
            from = %swap.status,
            to = %updated.status,
            "Swap transitioned"
        );

        self.announce(&updated, actor, action).await;
        Ok(updated)
    }

    async fn announce(&self, swap: &SwapRequest, actor: &User, action: SwapAction) {
        let related = Some(RelatedEntity::SwapRequest(swap.id));
        match action {
            SwapAction::Accept => {
                self.notifier
                    .notify_user(
                        swap.requester_id,
                        NotificationKind::SwapAccepted,
                        "Swap request accepted",
                        format!("{} accepted your swap request", actor.name),
                        related,
                    )
                    .await;
            }
            SwapAction::Reject => {
                self.notifier
                    .notify_user(
                        swap.requester_id,
                        NotificationKind::SwapRejected,
                        "Swap request declined",
                        format!("{} declined your swap request", actor.name),
                        related,
                    )
                    .await;
            }
            SwapAction::Complete => {
                for user_id in [swap.requester_id, swap.recipient_id] {
                    self.notifier
                        .notify_user(
                            user_id,
                            NotificationKind::SwapCompleted,
                            "Swap completed",
                            format!(
                                "The swap of {} for {} is complete. Leave feedback for your partner.",
                                swap.offered_skill, swap.wanted_skill
                            ),
                            related,
                        )
                        .await;
                }
            }
            SwapAction::Cancel => {}
        }
    }

    pub async fn list_for_user(
        &self,
        user: &User,
        status: Option<SwapStatus>,
        direction: SwapDirection,
        page: PageRequest,
    ) -> Result<Page<SwapRequest>, AppError> {
        let filter = SwapFilter {
            user_id: Some(user.id),
            direction,
            status,
        };
        self.store.list_swaps(&filter, page).await
    }

    pub async fn list_all(
        &self,
        user_id: Option<Uuid>,
        status: Option<SwapStatus>,
        page: PageRequest,
    ) -> Result<Page<SwapRequest>, AppError> {
        let filter = SwapFilter {
            user_id,
            direction: SwapDirection::All,
            status,
        };
        self.store.list_swaps(&filter, page).await
    }

    pub async fn stats_for_user(&self, user: &User) -> Result<SwapStatusCounts, AppError> {
        self.store.swap_status_counts(Some(user.id)).await
    }

    async fn load(&self, swap_id: Uuid) -> Result<SwapRequest, AppError> {
        self.store
            .find_swap(swap_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Swap request not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillswap_database::SwapFeedback;

    fn swap(status: SwapStatus) -> (SwapRequest, Uuid, Uuid) {
        let requester = Uuid::new_v4();
        let recipient = Uuid::new_v4();
        let now = Utc::now();
        let swap = SwapRequest {
            id: Uuid::new_v4(),
            requester_id: requester,
            recipient_id: recipient,
            offered_skill: "JavaScript".into(),
            wanted_skill: "Python".into(),
            message: String::new(),
            status,
            feedback: SwapFeedback::default(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        (swap, requester, recipient)
    }

    const ACTIONS: [SwapAction; 4] = [
        SwapAction::Accept,
        SwapAction::Reject,
        SwapAction::Cancel,
        SwapAction::Complete,
    ];

    #[test]
    fn test_only_listed_transitions_succeed() {
        let allowed = [
            (SwapStatus::Pending, SwapAction::Accept, Participant::Recipient, SwapStatus::Accepted),
            (SwapStatus::Pending, SwapAction::Reject, Participant::Recipient, SwapStatus::Rejected),
            (SwapStatus::Pending, SwapAction::Cancel, Participant::Requester, SwapStatus::Cancelled),
            (SwapStatus::Accepted, SwapAction::Complete, Participant::Requester, SwapStatus::Completed),
            (SwapStatus::Accepted, SwapAction::Complete, Participant::Recipient, SwapStatus::Completed),
        ];

        for status in SwapStatus::ALL {
            for action in ACTIONS {
                for actor in [Participant::Requester, Participant::Recipient] {
                    let (swap, _, _) = swap(status);
                    let result = check_transition(&swap, swap.user_id_of(actor), action);
                    let expected = allowed
                        .iter()
                        .find(|(s, a, p, _)| *s == status && *a == action && *p == actor)
                        .map(|(_, _, _, to)| *to);

                    match (expected, result) {
                        (Some(to), Ok(next)) => assert_eq!(next, to),
                        (None, Err(AppError::Authorization(_))) => {
                            assert!(!action.permits(actor), "{:?} {:?} {:?}", status, action, actor)
                        }
                        (None, Err(AppError::InvalidState(_))) => {
                            assert!(action.permits(actor), "{:?} {:?} {:?}", status, action, actor)
                        }
                        (expected, result) => panic!(
                            "{:?} {:?} by {:?}: expected {:?}, got {:?}",
                            status, action, actor, expected, result
                        ),
                    }
                }
            }
        }
    }

    #[test]
    fn test_outsiders_are_forbidden_in_every_state() {
        for status in SwapStatus::ALL {
            let (swap, _, _) = swap(status);
            for action in ACTIONS {
                assert!(matches!(
                    check_transition(&swap, Uuid::new_v4(), action),
                    Err(AppError::Authorization(_))
                ));
            }
        }
    }

    #[test]
    fn test_terminal_states_never_move() {
        for status in SwapStatus::ALL.into_iter().filter(SwapStatus::is_terminal) {
            let (swap, requester, recipient) = swap(status);
            for action in ACTIONS {
                assert!(check_transition(&swap, requester, action).is_err());
                assert!(check_transition(&swap, recipient, action).is_err());
            }
        }
    }

    #[test]
    fn test_wrong_actor_message_names_permitted_role() {
        let (swap, requester, _) = swap(SwapStatus::Pending);
        match check_transition(&swap, requester, SwapAction::Accept) {
            Err(AppError::Authorization(msg)) => assert_eq!(msg, "Only the recipient can accept this swap"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
