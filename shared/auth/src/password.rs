use bcrypt::{hash, verify, DEFAULT_COST};
use skillswap_common::AppError;

const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

#[derive(Debug, Clone, Copy)]
pub struct PasswordService {
    cost: u32,
}

impl Default for PasswordService {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

impl PasswordService {
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.clamp(MIN_BCRYPT_COST, MAX_BCRYPT_COST),
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        hash(password, self.cost)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        verify(password, hash)
            .map_err(|e| AppError::Internal(format!("Failed to verify password: {}", e)))
    }

    pub fn validate_password_strength(password: &str) -> Result<(), AppError> {
        if password.len() < 8 {
            return Err(AppError::Validation("Password must be at least 8 characters long".to_string()));
        }

        let has_letter = password.chars().any(|c| c.is_alphabetic());
        let has_digit = password.chars().any(|c| c.is_numeric());

        if !has_letter {
            return Err(AppError::Validation("Password must contain at least one letter".to_string()));
        }

        if !has_digit {
            return Err(AppError::Validation("Password must contain at least one digit".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let service = PasswordService::new(4);
        let hashed = service.hash_password("swap-me-123").unwrap();

        assert_ne!(hashed, "swap-me-123");
        assert!(service.verify_password("swap-me-123", &hashed).unwrap());
        assert!(!service.verify_password("swap-me-124", &hashed).unwrap());
    }

    #[test]
    fn test_cost_is_clamped_to_bcrypt_bounds() {
        let service = PasswordService::new(1);
        let hashed = service.hash_password("swap-me-123").unwrap();

        assert!(hashed.starts_with("$2b$04$"));
        assert!(service.verify_password("swap-me-123", &hashed).unwrap());
    }

    #[test]
    fn test_password_strength() {
        assert!(PasswordService::validate_password_strength("short1").is_err());
        assert!(PasswordService::validate_password_strength("lettersonly").is_err());
        assert!(PasswordService::validate_password_strength("12345678").is_err());
        assert!(PasswordService::validate_password_strength("letters123").is_ok());
    }
}
