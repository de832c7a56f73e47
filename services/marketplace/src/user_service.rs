use std::sync::Arc;

use uuid::Uuid;

use skillswap_auth::{JwtService, PasswordService};
use skillswap_common::{AppError, FieldError, Page, PageRequest, SkillList};
use skillswap_database::{MarketplaceStore, NewUser, User, UserSearch};

use crate::models::*;
use crate::state::AppState;

pub const MAX_SKILL_LEN: usize = 50;

/// Trims a skill name and checks its length. Case is preserved.
pub fn normalize_skill(raw: &str, field: &str) -> Result<String, AppError> {
    let skill = raw.trim();
    let len = skill.chars().count();
    if len == 0 || len > MAX_SKILL_LEN {
        return Err(AppError::InvalidFields(vec![FieldError::new(
            field,
            format!("Skill must be 1-{} characters", MAX_SKILL_LEN),
        )]));
    }
    Ok(skill.to_string())
}

/// Normalizes every entry and drops exact duplicates, keeping first-seen order.
pub fn normalize_skills(raw: &[String], field: &str) -> Result<Vec<String>, AppError> {
    let mut skills: Vec<String> = Vec::with_capacity(raw.len());
    for entry in raw {
        let skill = normalize_skill(entry, field)?;
        if !skills.contains(&skill) {
            skills.push(skill);
        }
    }
    Ok(skills)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct UserService {
    store: Arc<dyn MarketplaceStore>,
    jwt_service: JwtService,
    password_service: PasswordService,
    include_private: bool,
}

impl UserService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            jwt_service: state.jwt_service.clone(),
            password_service: state.password_service,
            include_private: state.config.matching.include_private_profiles,
        }
    }

    // User Registration
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AppError> {
        PasswordService::validate_password_strength(&request.password)?;

        let email = normalize_email(&request.email);
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }

        let offered_skills = normalize_skills(&request.offered_skills, "offered_skills")?;
        let wanted_skills = normalize_skills(&request.wanted_skills, "wanted_skills")?;
        let password_hash = self.password_service.hash_password(&request.password)?;

        let user = self
            .store
            .insert_user(NewUser {
                email,
                password_hash,
                name: request.name.trim().to_string(),
                location: non_empty(request.location),
                availability: request.availability.unwrap_or_default(),
                visibility: request.visibility.unwrap_or_default(),
                offered_skills,
                wanted_skills,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");
        self.auth_response(user)
    }

    // User Login
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AppError> {
        let invalid = || AppError::Authentication("Invalid email or password".to_string());

        let user = self
            .store
            .find_user_by_email(&normalize_email(&request.email))
            .await?
            .ok_or_else(invalid)?;

        if !self.password_service.verify_password(&request.password, &user.password_hash)? {
            return Err(invalid());
        }

        if user.is_banned {
            tracing::info!(user_id = %user.id, "Login refused for banned user");
            return Err(AppError::Authorization("Your account has been banned".to_string()));
        }

        tracing::info!(user_id = %user.id, "User logged in");
        self.auth_response(user)
    }

    fn auth_response(&self, user: User) -> Result<AuthResponse, AppError> {
        let issued = self.jwt_service.issue(user.id, &user.email)?;
        Ok(AuthResponse {
            token: issued.token,
            expires_at: issued.expires_at,
            user,
        })
    }

    pub async fn update_profile(
        &self,
        current: &User,
        request: UpdateProfileRequest,
    ) -> Result<User, AppError> {
        let mut user = current.clone();

        if let Some(name) = request.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(AppError::InvalidFields(vec![FieldError::new(
                    "name",
                    "Name must not be blank",
                )]));
            }
            user.name = name;
        }
        if request.location.is_some() {
            user.location = non_empty(request.location);
        }
        if request.photo_url.is_some() {
            user.photo_url = non_empty(request.photo_url);
        }
        if request.bio.is_some() {
            user.bio = non_empty(request.bio);
        }
        if let Some(availability) = request.availability {
            user.availability = availability;
        }
        if let Some(visibility) = request.visibility {
            user.visibility = visibility;
        }
        if let Some(skills) = request.offered_skills {
            user.offered_skills = normalize_skills(&skills, "offered_skills")?;
        }
        if let Some(skills) = request.wanted_skills {
            user.wanted_skills = normalize_skills(&skills, "wanted_skills")?;
        }

        let updated = self
            .store
            .update_profile(&user)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        tracing::info!(user_id = %updated.id, "Profile updated");
        Ok(updated)
    }

    /// Adding a skill that is already listed leaves the profile unchanged.
    pub async fn add_skill(&self, current: &User, list: SkillList, raw: &str) -> Result<User, AppError> {
        let skill = normalize_skill(raw, "skill")?;
        if current.skills(list).contains(&skill) {
            return Ok(current.clone());
        }

        let mut user = current.clone();
        user.skills_mut(list).push(skill);
        self.store
            .update_profile(&user)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Removing a skill that is not listed leaves the profile unchanged.
    pub async fn remove_skill(&self, current: &User, list: SkillList, raw: &str) -> Result<User, AppError> {
        let skill = raw.trim();
        if !current.skills(list).iter().any(|s| s == skill) {
            return Ok(current.clone());
        }

        let mut user = current.clone();
        user.skills_mut(list).retain(|s| s != skill);
        self.store
            .update_profile(&user)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Owners see their full record. Everyone else, admins included, sees only
    /// public, non-banned profiles; admins read full records through the
    /// admin user listing.
    pub async fn view_profile(&self, viewer: &User, user_id: Uuid) -> Result<ProfileView, AppError> {
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if viewer.id == user.id {
            return Ok(ProfileView::Full(user));
        }
        if user.is_banned {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        if !user.is_public() {
            return Err(AppError::Authorization("This profile is private".to_string()));
        }
        Ok(ProfileView::Public(user.into()))
    }

    pub async fn search(
        &self,
        viewer: &User,
        query: UserQuery,
        page: PageRequest,
    ) -> Result<Page<PublicProfile>, AppError> {
        let search = UserSearch {
            text: non_empty(query.q),
            skill: non_empty(query.skill),
            availability: query.availability,
            location: non_empty(query.location),
            exclude: Some(viewer.id),
            include_private: self.include_private,
            include_banned: false,
        };

        let users = self.store.search_users(&search, page).await?;
        Ok(users.map(PublicProfile::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_skill_trims_and_bounds() {
        assert_eq!(normalize_skill("  Rust ", "skill").unwrap(), "Rust");
        assert!(normalize_skill("   ", "skill").is_err());
        assert!(normalize_skill(&"x".repeat(51), "skill").is_err());
        assert!(normalize_skill(&"x".repeat(50), "skill").is_ok());
    }

    #[test]
    fn test_normalize_skills_dedupes_exact_names_only() {
        let raw = vec![
            "Python".to_string(),
            " Python".to_string(),
            "python".to_string(),
        ];
        let skills = normalize_skills(&raw, "offered_skills").unwrap();
        assert_eq!(skills, vec!["Python".to_string(), "python".to_string()]);
    }
}
