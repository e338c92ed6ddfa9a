//! Application state - Dependency injection container.
//!
//! Provides centralized access to all application services and infrastructure.

use std::sync::Arc;

use super::session::SessionSettings;
use crate::config::Config;
use crate::infra::{CacheStore, Database};
use crate::jobs::Mailer;
use crate::services::{AuthService, ServiceContainer, Services, UserService};

/// Per-client request budgets.
#[derive(Clone, Copy, Debug)]
pub struct RateLimits {
    /// Requests per window on general routes
    pub general: u64,
    /// Requests per window on authentication routes
    pub auth: u64,
    /// Identify clients by forwarding headers instead of the peer address
    pub trust_proxy_headers: bool,
}

/// Application state containing all services (DI container).
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth_service: Arc<dyn AuthService>,
    /// User service
    pub user_service: Arc<dyn UserService>,
    /// Rate limit counters and revocation list
    pub cache: Arc<dyn CacheStore>,
    /// Database connection
    pub database: Arc<Database>,
    /// Session cookie attributes
    pub session: SessionSettings,
    pub rate_limits: RateLimits,
}

impl AppState {
    /// Create application state from the infrastructure handles and config.
    pub fn from_config(
        database: Arc<Database>,
        cache: Arc<dyn CacheStore>,
        mailer: Arc<dyn Mailer>,
        config: &Config,
    ) -> Self {
        let container = Services::from_connection(
            database.get_connection(),
            cache.clone(),
            mailer,
            config,
        );

        Self::new(&container, cache, database, config)
    }

    /// Create application state around an existing service container.
    pub fn new(
        services: &dyn ServiceContainer,
        cache: Arc<dyn CacheStore>,
        database: Arc<Database>,
        config: &Config,
    ) -> Self {
        Self {
            auth_service: services.auth(),
            user_service: services.users(),
            cache,
            database,
            session: SessionSettings::from_config(config),
            rate_limits: RateLimits {
                general: config.rate_limit_requests,
                auth: config.rate_limit_auth_requests,
                trust_proxy_headers: config.trust_proxy_headers,
            },
        }
    }
}
