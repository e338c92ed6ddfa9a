//! Authentication service - credential checks and session tokens.
//!
//! Pairs the JWT strategy with a revocation list kept in the cache, so a
//! logged-out token stops authenticating before it expires.

use async_trait::async_trait;
use std::sync::Arc;

use super::tokens::{Claims, TokenIssuer, TokenResponse};
use crate::domain::{normalize_email, password::DUMMY_HASH, Password, User};
use crate::errors::{AppError, AppResult};
use crate::infra::{CacheStore, UserRepository};

/// The authenticated principal behind a request.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub user: User,
    pub claims: Claims,
}

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Check an email/password pair and return the account.
    async fn authenticate(&self, email: &str, password: &str) -> AppResult<User>;

    /// Issue a session token for an authenticated user
    fn login(&self, user: &User) -> AppResult<TokenResponse>;

    /// Resolve a session token to an active user
    async fn read_token(&self, token: &str) -> AppResult<CurrentUser>;

    /// Revoke the session token described by `claims`
    async fn logout(&self, claims: &Claims) -> AppResult<()>;
}

/// Concrete implementation of AuthService.
pub struct Authenticator {
    users: Arc<dyn UserRepository>,
    cache: Arc<dyn CacheStore>,
    tokens: TokenIssuer,
    require_verified: bool,
}

impl Authenticator {
    pub fn new(
        users: Arc<dyn UserRepository>,
        cache: Arc<dyn CacheStore>,
        tokens: TokenIssuer,
        require_verified: bool,
    ) -> Self {
        Self {
            users,
            cache,
            tokens,
            require_verified,
        }
    }
}

#[async_trait]
impl AuthService for Authenticator {
    async fn authenticate(&self, email: &str, password: &str) -> AppResult<User> {
        let user = self.users.find_by_email(&normalize_email(email)).await?;

        // Verify against a dummy hash for unknown emails so both paths cost the same
        let hash = user
            .as_ref()
            .map(|u| u.password_hash.clone())
            .unwrap_or_else(|| DUMMY_HASH.to_string());
        let password_valid = Password::from_hash(hash).verify(password);

        let user = match user {
            Some(user) if password_valid && user.is_active => user,
            _ => {
                tracing::info!("Rejected login attempt");
                return Err(AppError::InvalidCredentials);
            }
        };

        if !user.can_login(self.require_verified) {
            return Err(AppError::UserNotVerified);
        }

        Ok(user)
    }

    fn login(&self, user: &User) -> AppResult<TokenResponse> {
        self.tokens.issue_access(user)
    }

    async fn read_token(&self, token: &str) -> AppResult<CurrentUser> {
        let claims = self.tokens.decode_access(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected session token");
            AppError::Unauthorized
        })?;

        match self.cache.is_revoked(&claims.jti.to_string()).await {
            Ok(false) => {}
            Ok(true) => return Err(AppError::Unauthorized),
            Err(e) => {
                tracing::error!(error = %e, "Revocation check failed - rejecting token");
                return Err(AppError::Unauthorized);
            }
        }

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .filter(|user| user.is_active)
            .ok_or(AppError::Unauthorized)?;

        Ok(CurrentUser { user, claims })
    }

    async fn logout(&self, claims: &Claims) -> AppResult<()> {
        self.cache
            .revoke(&claims.jti.to_string(), claims.remaining_seconds())
            .await?;

        tracing::info!(user_id = %claims.sub, "User logged out");
        Ok(())
    }
}
