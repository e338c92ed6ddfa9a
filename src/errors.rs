//! Centralized error handling.
//!
//! Provides a unified error type for the entire application,
//! with automatic HTTP response conversion.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication & Authorization
    #[error("Authentication required")]
    Unauthorized,

    #[error("Access denied")]
    Forbidden,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User is not verified")]
    UserNotVerified,

    // Resource errors
    #[error("Resource not found")]
    NotFound,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Email already in use")]
    EmailAlreadyExists,

    // Account flows
    #[error("{0}")]
    InvalidPassword(String),

    #[error("Invalid or expired reset token")]
    ResetPasswordBadToken,

    #[error("Invalid or expired verification token")]
    VerifyBadToken,

    #[error("User is already verified")]
    AlreadyVerified,

    // Validation
    #[error("{0}")]
    Validation(String),

    // External service errors
    #[error("Database error")]
    Database(#[from] sea_orm::DbErr),

    #[error("Token error")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Template error")]
    Template(#[from] askama::Error),

    // Internal
    #[error("Internal server error")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl AppError {
    /// Get error code for client
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Forbidden => "FORBIDDEN",
            AppError::InvalidCredentials => "LOGIN_BAD_CREDENTIALS",
            AppError::UserNotVerified => "LOGIN_USER_NOT_VERIFIED",
            AppError::NotFound => "NOT_FOUND",
            AppError::UserAlreadyExists => "REGISTER_USER_ALREADY_EXISTS",
            AppError::EmailAlreadyExists => "UPDATE_USER_EMAIL_ALREADY_EXISTS",
            AppError::InvalidPassword(_) => "INVALID_PASSWORD",
            AppError::ResetPasswordBadToken => "RESET_PASSWORD_BAD_TOKEN",
            AppError::VerifyBadToken => "VERIFY_USER_BAD_TOKEN",
            AppError::AlreadyVerified => "VERIFY_USER_ALREADY_VERIFIED",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Jwt(_) => "AUTH_ERROR",
            AppError::Template(_) => "TEMPLATE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::InvalidCredentials
            | AppError::UserNotVerified
            | AppError::UserAlreadyExists
            | AppError::EmailAlreadyExists
            | AppError::InvalidPassword(_)
            | AppError::ResetPasswordBadToken
            | AppError::VerifyBadToken
            | AppError::AlreadyVerified
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_)
            | AppError::Jwt(_)
            | AppError::Template(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get user-facing message (hides internal details)
    fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::InvalidPassword(msg) => msg.clone(),

            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "A database error occurred".to_string()
            }
            AppError::Jwt(e) => {
                tracing::error!("JWT error: {:?}", e);
                "An internal error occurred".to_string()
            }
            AppError::Template(e) => {
                tracing::error!("Template error: {:?}", e);
                "An internal error occurred".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }

            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code().to_string(),
                message: self.user_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Convenience constructors
impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn invalid_password(msg: impl Into<String>) -> Self {
        AppError::InvalidPassword(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}

/// Map a failed insert/update to `conflict` when it violated a unique index.
pub(crate) fn map_unique_violation(err: sea_orm::DbErr, conflict: AppError) -> AppError {
    match err.sql_err() {
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => conflict,
        _ => AppError::Database(err),
    }
}
