use std::sync::Arc;

use skillswap_auth::{JwtService, PasswordService};
use skillswap_common::PageRequest;
use skillswap_database::MarketplaceStore;

use crate::config::AppConfig;
use crate::connection_manager::ConnectionManager;
use crate::notifier::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MarketplaceStore>,
    pub jwt_service: JwtService,
    pub password_service: PasswordService,
    pub connection_manager: ConnectionManager,
    pub notifier: Notifier,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn MarketplaceStore>, config: AppConfig) -> Self {
        let connection_manager = ConnectionManager::new();
        Self {
            notifier: Notifier::new(store.clone(), connection_manager.clone()),
            jwt_service: JwtService::new(&config.jwt),
            password_service: PasswordService::new(config.auth.bcrypt_cost),
            connection_manager,
            store,
            config,
        }
    }

    pub fn page(&self, page: Option<u32>, limit: Option<u32>) -> PageRequest {
        PageRequest::new(
            page,
            limit,
            self.config.paging.default_page_size,
            self.config.paging.max_page_size,
        )
    }
}
