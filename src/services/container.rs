//! Service Container - Centralized service access.
//!
//! Builds every service once from the infrastructure handles and shares
//! them as trait objects.

use std::sync::Arc;

use super::{AuthService, Authenticator, TokenIssuer, UserManager, UserService};
use crate::config::Config;
use crate::infra::{CacheStore, UserStore};
use crate::jobs::Mailer;

/// Service container trait for dependency injection.
pub trait ServiceContainer: Send + Sync {
    /// Get authentication service
    fn auth(&self) -> Arc<dyn AuthService>;

    /// Get user service
    fn users(&self) -> Arc<dyn UserService>;
}

/// Concrete implementation of ServiceContainer
#[derive(Clone)]
pub struct Services {
    auth_service: Arc<dyn AuthService>,
    user_service: Arc<dyn UserService>,
}

impl Services {
    /// Create a new service container from already built services
    pub fn new(auth_service: Arc<dyn AuthService>, user_service: Arc<dyn UserService>) -> Self {
        Self {
            auth_service,
            user_service,
        }
    }

    /// Wire the services over a database connection, cache and mailer.
    pub fn from_connection(
        db: sea_orm::DatabaseConnection,
        cache: Arc<dyn CacheStore>,
        mailer: Arc<dyn Mailer>,
        config: &Config,
    ) -> Self {
        let users = Arc::new(UserStore::new(db));
        let tokens = TokenIssuer::new(config);

        let auth_service = Arc::new(Authenticator::new(
            users.clone(),
            cache,
            tokens.clone(),
            config.require_verified_login,
        ));
        let user_service = Arc::new(UserManager::new(
            users,
            mailer,
            tokens,
            config.public_base_url.clone(),
            config.send_verification_on_register,
        ));

        Self::new(auth_service, user_service)
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn users(&self) -> Arc<dyn UserService> {
        self.user_service.clone()
    }
}
