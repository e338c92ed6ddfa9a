//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{ROLE_ADMIN, ROLE_USER};

/// User roles enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    /// Check if this role has admin (superuser) privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl From<&str> for UserRole {
    fn from(s: &str) -> Self {
        match s {
            ROLE_ADMIN => UserRole::Admin,
            _ => UserRole::User,
        }
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        role.to_string()
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "{}", ROLE_ADMIN),
            UserRole::User => write!(f, "{}", ROLE_USER),
        }
    }
}

/// User domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new, active, unverified user with the default role
    pub fn new(id: Uuid, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            email,
            password_hash,
            role: UserRole::User,
            is_active: true,
            is_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if user is a superuser
    pub fn is_superuser(&self) -> bool {
        self.role.is_admin()
    }

    /// Whether this account may open a session.
    pub fn can_login(&self, requires_verification: bool) -> bool {
        self.is_active && (!requires_verification || self.is_verified)
    }
}

/// Field changes applied by the user manager.
///
/// `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    /// New email address
    pub email: Option<String>,
    /// New password (minimum 8 characters)
    pub password: Option<String>,
    /// Activate or deactivate the account (superuser only)
    pub is_active: Option<bool>,
    /// Grant or revoke superuser rights (superuser only)
    pub is_superuser: Option<bool>,
    /// Mark the email as verified (superuser only)
    pub is_verified: Option<bool>,
}

impl UserUpdate {
    /// Drop the privileged fields a user may not change on their own account.
    pub fn into_safe(self) -> Self {
        Self {
            email: self.email,
            password: self.password,
            is_active: None,
            is_superuser: None,
            is_verified: None,
        }
    }
}

/// Column values written by the repository on update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    pub is_verified: Option<bool>,
}

impl UserChanges {
    /// True when nothing would be written
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    /// Unique user identifier
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    /// User email address
    #[schema(example = "user@example.com")]
    pub email: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            is_superuser: user.is_superuser(),
            id: user.id,
            email: user.email,
            is_active: user.is_active,
            is_verified: user.is_verified,
        }
    }
}

/// Canonical form used for storage and lookups (emails compare case-insensitively).
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
