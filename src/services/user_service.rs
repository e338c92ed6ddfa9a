//! User service - the user manager.
//!
//! Owns the account lifecycle: registration, updates, deletion, password
//! reset and email verification. Lifecycle hooks (`on_after_*`) log the
//! event and hand outgoing emails to the configured [`Mailer`].

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::tokens::TokenIssuer;
use crate::domain::{normalize_email, Password, User, UserChanges, UserRole, UserUpdate};
use crate::errors::{AppError, AppResult};
use crate::infra::UserRepository;
use crate::jobs::{EmailJob, Mailer};

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Register a new active, unverified user.
    async fn create(&self, email: &str, password: &str) -> AppResult<User>;

    /// Get user by ID
    async fn get(&self, id: Uuid) -> AppResult<User>;

    /// Apply an update. `safe` updates ignore role, active and verified flags.
    async fn update(&self, id: Uuid, update: UserUpdate, safe: bool) -> AppResult<User>;

    /// Permanently delete user
    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Email a reset token. Silent for unknown or inactive accounts.
    async fn forgot_password(&self, email: &str) -> AppResult<()>;

    /// Replace the password using a reset token.
    async fn reset_password(&self, token: &str, password: &str) -> AppResult<User>;

    /// Email a verification token. Silent for unknown, inactive or verified accounts.
    async fn request_verify(&self, email: &str) -> AppResult<()>;

    /// Mark the account named by a verification token as verified.
    async fn verify(&self, token: &str) -> AppResult<User>;

    /// Grant the superuser role.
    async fn promote(&self, email: &str) -> AppResult<User>;

    /// Hook run after a successful login.
    async fn on_after_login(&self, user: &User);
}

/// Concrete implementation of UserService.
pub struct UserManager {
    users: Arc<dyn UserRepository>,
    mailer: Arc<dyn Mailer>,
    tokens: TokenIssuer,
    public_base_url: String,
    send_verification_on_register: bool,
}

impl UserManager {
    pub fn new(
        users: Arc<dyn UserRepository>,
        mailer: Arc<dyn Mailer>,
        tokens: TokenIssuer,
        public_base_url: impl Into<String>,
        send_verification_on_register: bool,
    ) -> Self {
        Self {
            users,
            mailer,
            tokens,
            public_base_url: public_base_url.into(),
            send_verification_on_register,
        }
    }

    /// Password rules: minimum length, and no embedded email address.
    fn validate_password(password: &str, email: &str) -> AppResult<()> {
        Password::validate(password)?;
        if !email.is_empty() && password.to_lowercase().contains(&email.to_lowercase()) {
            return Err(AppError::invalid_password("Password should not contain e-mail"));
        }
        Ok(())
    }

    async fn send_mail(&self, job: EmailJob) {
        let to = job.to.clone();
        if let Err(e) = self.mailer.send(job).await {
            tracing::error!(to = %to, error = %e, "Failed to dispatch email");
        }
    }

    async fn send_verification(&self, user: &User) -> AppResult<()> {
        let token = self.tokens.issue_verify(user)?;
        tracing::info!(user_id = %user.id, "Verification requested");
        self.send_mail(EmailJob::verify_email(&user.email, &token, &self.public_base_url))
            .await;
        Ok(())
    }

    /// Runs after the user row is stored; failures are logged, never returned.
    async fn on_after_register(&self, user: &User) {
        tracing::info!(user_id = %user.id, "User has registered");
        if !self.send_verification_on_register {
            return;
        }
        if let Err(e) = self.send_verification(user).await {
            tracing::error!(user_id = %user.id, error = %e, "Verification after registration failed");
        }
    }
}

#[async_trait]
impl UserService for UserManager {
    async fn create(&self, email: &str, password: &str) -> AppResult<User> {
        let email = normalize_email(email);
        Self::validate_password(password, &email)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::UserAlreadyExists);
        }

        let password_hash = Password::new(password)?.into_string();
        let user = self.users.create(email, password_hash).await?;

        self.on_after_register(&user).await;
        Ok(user)
    }

    async fn get(&self, id: Uuid) -> AppResult<User> {
        self.users.find_by_id(id).await?.ok_or(AppError::NotFound)
    }

    async fn update(&self, id: Uuid, update: UserUpdate, safe: bool) -> AppResult<User> {
        let update = if safe { update.into_safe() } else { update };
        let user = self.get(id).await?;
        let mut changes = UserChanges::default();

        if let Some(email) = update.email {
            let email = normalize_email(&email);
            if email != user.email {
                if self.users.find_by_email(&email).await?.is_some() {
                    return Err(AppError::EmailAlreadyExists);
                }
                changes.email = Some(email);
                changes.is_verified = Some(false);
            }
        }

        if let Some(password) = update.password {
            let email = changes.email.as_deref().unwrap_or(&user.email);
            Self::validate_password(&password, email)?;
            changes.password_hash = Some(Password::new(&password)?.into_string());
        }

        if let Some(is_active) = update.is_active {
            changes.is_active = Some(is_active);
        }
        if let Some(is_verified) = update.is_verified {
            changes.is_verified = Some(is_verified);
        }
        if let Some(is_superuser) = update.is_superuser {
            changes.role = Some(if is_superuser {
                UserRole::Admin
            } else {
                UserRole::User
            });
        }

        let user = self.users.update(id, changes).await?;
        tracing::info!(user_id = %user.id, "User has been updated");
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let user = self.get(id).await?;
        self.users.delete(user.id).await?;
        tracing::info!(user_id = %user.id, "User has been deleted");
        Ok(())
    }

    async fn forgot_password(&self, email: &str) -> AppResult<()> {
        let user = match self.users.find_by_email(&normalize_email(email)).await? {
            Some(user) if user.is_active => user,
            _ => return Ok(()),
        };

        let fingerprint = Password::from_hash(user.password_hash.clone()).fingerprint()?;
        let token = self.tokens.issue_reset(&user, fingerprint)?;

        tracing::info!(user_id = %user.id, "User has forgot their password");
        self.send_mail(EmailJob::reset_password(&user.email, &token, &self.public_base_url))
            .await;
        Ok(())
    }

    async fn reset_password(&self, token: &str, password: &str) -> AppResult<User> {
        let claims = self.tokens.decode_reset(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected reset token");
            AppError::ResetPasswordBadToken
        })?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .filter(|user| user.is_active)
            .ok_or(AppError::ResetPasswordBadToken)?;

        if !Password::from_hash(user.password_hash.clone()).matches_fingerprint(&claims.password_fgpt)
        {
            return Err(AppError::ResetPasswordBadToken);
        }

        Self::validate_password(password, &user.email)?;
        let changes = UserChanges {
            password_hash: Some(Password::new(password)?.into_string()),
            ..Default::default()
        };

        let user = self.users.update(user.id, changes).await?;
        tracing::info!(user_id = %user.id, "User has reset their password");
        Ok(user)
    }

    async fn request_verify(&self, email: &str) -> AppResult<()> {
        match self.users.find_by_email(&normalize_email(email)).await? {
            Some(user) if user.is_active && !user.is_verified => self.send_verification(&user).await,
            _ => Ok(()),
        }
    }

    async fn verify(&self, token: &str) -> AppResult<User> {
        let claims = self.tokens.decode_verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected verification token");
            AppError::VerifyBadToken
        })?;

        let user = self
            .users
            .find_by_email(&claims.email)
            .await?
            .filter(|user| user.id == claims.sub)
            .ok_or(AppError::VerifyBadToken)?;

        if user.is_verified {
            return Err(AppError::AlreadyVerified);
        }

        let changes = UserChanges {
            is_verified: Some(true),
            ..Default::default()
        };
        let user = self.users.update(user.id, changes).await?;
        tracing::info!(user_id = %user.id, "User has been verified");
        Ok(user)
    }

    async fn promote(&self, email: &str) -> AppResult<User> {
        let user = self
            .users
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AppError::NotFound)?;

        let changes = UserChanges {
            role: Some(UserRole::Admin),
            ..Default::default()
        };
        let user = self.users.update(user.id, changes).await?;
        tracing::info!(user_id = %user.id, "User promoted to superuser");
        Ok(user)
    }

    async fn on_after_login(&self, user: &User) {
        tracing::info!(user_id = %user.id, "User logged in");
    }
}
