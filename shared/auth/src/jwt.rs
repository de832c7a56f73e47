use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use skillswap_common::{AppError, JwtConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub email: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

impl Claims {
    pub fn new(user_id: Uuid, email: String, config: &JwtConfig) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(config.expiration_hours as i64);

        Self {
            sub: user_id.to_string(),
            email,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: config.issuer.clone(),
        }
    }

    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|e| AppError::Authentication(format!("Invalid user ID in token: {}", e)))
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}

/// A freshly minted bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_issuer(&[config.issuer.as_str()]);

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            config: config.clone(),
        }
    }

    pub fn generate_token(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
    }

    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<IssuedToken, AppError> {
        let claims = Claims::new(user_id, email.to_string(), &self.config);
        let token = self.generate_token(&claims)?;
        Ok(IssuedToken {
            token,
            expires_at: claims.expires_at(),
        })
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::Authentication(format!("Invalid token: {}", e)))
    }

    pub fn extract_user_id(&self, token: &str) -> Result<Uuid, AppError> {
        self.validate_token(token)?.user_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".to_string(),
            expiration_hours: 1,
            issuer: "skillswap-test".to_string(),
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let service = JwtService::new(&config());
        let user_id = Uuid::new_v4();

        let issued = service.issue(user_id, "a@example.com").unwrap();
        assert!(issued.expires_at > Utc::now());
        assert_eq!(service.extract_user_id(&issued.token).unwrap(), user_id);
    }

    #[test]
    fn test_rejects_foreign_secret_and_issuer() {
        let service = JwtService::new(&config());
        let token = service.issue(Uuid::new_v4(), "a@example.com").unwrap().token;

        let other_secret = JwtService::new(&JwtConfig {
            secret: "another".to_string(),
            ..config()
        });
        assert!(matches!(
            other_secret.validate_token(&token),
            Err(AppError::Authentication(_))
        ));

        let other_issuer = JwtService::new(&JwtConfig {
            issuer: "someone-else".to_string(),
            ..config()
        });
        assert!(other_issuer.validate_token(&token).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        let service = JwtService::new(&config());
        assert!(service.validate_token("not-a-token").is_err());
    }
}
