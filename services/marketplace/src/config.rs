use std::str::FromStr;

use serde::{Deserialize, Serialize};
use skillswap_common::{env_or, AppError, DatabaseConfig, JwtConfig, ServerConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageBackend,
    pub jwt: JwtConfig,
    pub auth: AuthConfig,
    pub matching: MatchingConfig,
    pub paging: PagingConfig,
    pub push: PushConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MatchingConfig {
    /// Whether private profiles show up in matches and directory search.
    pub include_private_profiles: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagingConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    pub heartbeat_secs: u64,
    pub max_connections_per_user: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { bcrypt_cost: 12 }
    }
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            heartbeat_secs: 30,
            max_connections_per_user: 5,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            storage: StorageBackend::default(),
            jwt: JwtConfig::default(),
            auth: AuthConfig::default(),
            matching: MatchingConfig::default(),
            paging: PagingConfig::default(),
            push: PushConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();
        let config = Self {
            server: ServerConfig::from_env(),
            database: DatabaseConfig::from_env(),
            storage: env_or("STORAGE_BACKEND", defaults.storage),
            jwt: JwtConfig::from_env(),
            auth: AuthConfig {
                bcrypt_cost: env_or("BCRYPT_COST", defaults.auth.bcrypt_cost),
            },
            matching: MatchingConfig {
                include_private_profiles: env_or(
                    "MATCH_INCLUDE_PRIVATE",
                    defaults.matching.include_private_profiles,
                ),
            },
            paging: PagingConfig {
                default_page_size: env_or("DEFAULT_PAGE_SIZE", defaults.paging.default_page_size),
                max_page_size: env_or("MAX_PAGE_SIZE", defaults.paging.max_page_size),
            },
            push: PushConfig {
                heartbeat_secs: env_or("WS_HEARTBEAT_SECS", defaults.push.heartbeat_secs),
                max_connections_per_user: env_or(
                    "WS_MAX_CONNECTIONS_PER_USER",
                    defaults.push.max_connections_per_user,
                ),
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(AppError::Validation("JWT_SECRET must not be empty".to_string()));
        }
        if self.paging.default_page_size == 0 || self.paging.default_page_size > self.paging.max_page_size {
            return Err(AppError::Validation(
                "DEFAULT_PAGE_SIZE must be between 1 and MAX_PAGE_SIZE".to_string(),
            ));
        }
        if self.push.heartbeat_secs == 0 {
            return Err(AppError::Validation("WS_HEARTBEAT_SECS must be positive".to_string()));
        }
        Ok(())
    }
}
