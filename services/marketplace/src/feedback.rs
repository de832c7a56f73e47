use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use skillswap_common::{AppError, NotificationKind, RelatedEntity, SwapStatus};
use skillswap_database::{FeedbackEntry, MarketplaceStore, SwapRequest, User};

use crate::models::{FeedbackRequest, FeedbackResponse};
use crate::notifier::Notifier;
use crate::state::AppState;

pub struct FeedbackService {
    store: Arc<dyn MarketplaceStore>,
    notifier: Notifier,
}

impl FeedbackService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            notifier: state.notifier.clone(),
        }
    }

    /// Records the caller's rating of their swap partner. The store folds it
    /// into the partner's reputation in the same write.
    pub async fn submit(
        &self,
        author: &User,
        swap_id: Uuid,
        request: FeedbackRequest,
    ) -> Result<FeedbackResponse, AppError> {
        let swap = self
            .store
            .find_swap(swap_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Swap request not found".to_string()))?;

        let slot = swap.participant(author.id).ok_or_else(|| {
            AppError::Authorization("You are not a participant in this swap".to_string())
        })?;

        if swap.status != SwapStatus::Completed {
            return Err(AppError::InvalidState(
                "Feedback can only be left on completed swaps".to_string(),
            ));
        }

        if swap.feedback.slot(slot).is_some() {
            return Err(already_submitted());
        }

        let entry = FeedbackEntry {
            rating: request.rating,
            comment: request
                .comment
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            submitted_at: Utc::now(),
        };

        // Completed is terminal, so a miss here means the slot was filled concurrently.
        // The partner's rating is folded in by the same write.
        let updated = self
            .store
            .record_feedback(swap.id, slot, entry)
            .await?
            .ok_or_else(already_submitted)?;

        tracing::info!(
            swap_id = %updated.id,
            author = %author.id,
            partner = %updated.user_id_of(slot.other()),
            rating = request.rating,
            "Feedback recorded"
        );

        let feedback_complete = updated.feedback.is_complete();
        if feedback_complete {
            self.announce_complete(&updated).await;
        }

        Ok(FeedbackResponse {
            swap: updated,
            feedback_complete,
        })
    }

    async fn announce_complete(&self, swap: &SwapRequest) {
        for user_id in [swap.requester_id, swap.recipient_id] {
            self.notifier
                .notify_user(
                    user_id,
                    NotificationKind::FeedbackReceived,
                    "Feedback received",
                    "Both of you have left feedback on your completed swap",
                    Some(RelatedEntity::SwapRequest(swap.id)),
                )
                .await;
        }
    }
}

fn already_submitted() -> AppError {
    AppError::DuplicateFeedback("You have already left feedback for this swap".to_string())
}
