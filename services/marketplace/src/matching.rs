use std::sync::Arc;

use skillswap_common::{AppError, Page, PageRequest};
use skillswap_database::{MarketplaceStore, User};

use crate::models::{PublicProfile, SkillMatch};
use crate::state::AppState;

/// Skills present in both lists, in `from` order.
fn overlap(from: &[String], with: &[String]) -> Vec<String> {
    from.iter().filter(|s| with.contains(s)).cloned().collect()
}

/// Describes why `candidate` complements `user`.
pub fn describe_match(user: &User, candidate: User) -> SkillMatch {
    let can_teach_you = overlap(&candidate.offered_skills, &user.wanted_skills);
    let wants_from_you = overlap(&candidate.wanted_skills, &user.offered_skills);
    SkillMatch {
        profile: PublicProfile::from(candidate),
        can_teach_you,
        wants_from_you,
    }
}

pub struct MatchService {
    store: Arc<dyn MarketplaceStore>,
    include_private: bool,
}

impl MatchService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            include_private: state.config.matching.include_private_profiles,
        }
    }

    /// Members whose skills complement the user's, best rated first.
    pub async fn matches_for(&self, user: &User, page: PageRequest) -> Result<Page<SkillMatch>, AppError> {
        if user.offered_skills.is_empty() && user.wanted_skills.is_empty() {
            return Ok(Page::new(Vec::new(), page, 0));
        }

        let candidates = self
            .store
            .find_skill_matches(user, self.include_private, page)
            .await?;

        tracing::debug!(user_id = %user.id, total = candidates.total, "Skill matches computed");
        Ok(candidates.map(|candidate| describe_match(user, candidate)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use skillswap_common::{Availability, ProfileVisibility};
    use uuid::Uuid;

    fn user(offered: &[&str], wanted: &[&str]) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "m@example.com".into(),
            password_hash: String::new(),
            name: "M".into(),
            location: None,
            photo_url: None,
            bio: None,
            offered_skills: offered.iter().map(|s| s.to_string()).collect(),
            wanted_skills: wanted.iter().map(|s| s.to_string()).collect(),
            availability: Availability::Flexible,
            visibility: ProfileVisibility::Public,
            is_admin: false,
            is_banned: false,
            rating: 0.0,
            review_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_describe_match_lists_both_directions() {
        let me = user(&["JavaScript", "Cooking"], &["Python", "Guitar"]);
        let them = user(&["Guitar", "Python", "Go"], &["Cooking"]);

        let described = describe_match(&me, them);
        assert_eq!(described.can_teach_you, vec!["Guitar", "Python"]);
        assert_eq!(described.wants_from_you, vec!["Cooking"]);
    }
}
