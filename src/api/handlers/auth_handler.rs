//! Authentication handlers.
//!
//! Session login/logout over the cookie transport, registration and the
//! account recovery flows (forgot/reset password, request/verify email).

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json, Response},
    routing::post,
    Form, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::{auth_middleware, CurrentUser};
use crate::api::AppState;
use crate::domain::UserResponse;
use crate::errors::AppResult;

/// OAuth2 password form used by the JWT login route
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginForm {
    /// Account email address
    #[schema(example = "user@example.com")]
    pub username: String,
    #[schema(example = "SecurePass123!")]
    pub password: String,
}

/// User registration request
///
/// Privileged fields (`is_active`, `is_superuser`, `is_verified`) are
/// not part of the payload and are ignored if sent.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// User email address
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,
    /// User password (minimum 8 characters)
    #[schema(example = "SecurePass123!", min_length = 8)]
    pub password: String,
}

/// Request carrying only an email address
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EmailRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,
}

/// Password reset request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    /// Token received by email
    pub token: String,
    /// New password
    #[schema(example = "AnotherPass123!")]
    pub password: String,
}

/// Email verification request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyRequest {
    /// Token received by email
    pub token: String,
}

/// Create authentication routes
pub fn auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/jwt/login", post(jwt_login))
        .route(
            "/jwt/logout",
            post(jwt_logout).route_layer(middleware::from_fn_with_state(state, auth_middleware)),
        )
        .route("/register", post(register))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route("/request-verify-token", post(request_verify_token))
        .route("/verify", post(verify))
}

/// Log in and receive the session cookie
#[utoipa::path(
    post,
    path = "/auth/jwt/login",
    tag = "Authentication",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 204, description = "Logged in, session cookie set"),
        (status = 400, description = "LOGIN_BAD_CREDENTIALS or LOGIN_USER_NOT_VERIFIED"),
        (status = 422, description = "Missing form field")
    )
)]
pub async fn jwt_login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let user = state
        .auth_service
        .authenticate(&form.username, &form.password)
        .await?;
    let token = state.auth_service.login(&user)?;
    state.user_service.on_after_login(&user).await;

    let headers = state.session.login_headers(&token.access_token)?;
    Ok((StatusCode::NO_CONTENT, headers).into_response())
}

/// Log out and clear the session cookie
#[utoipa::path(
    post,
    path = "/auth/jwt/logout",
    tag = "Authentication",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    responses(
        (status = 204, description = "Logged out, session cookie cleared"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn jwt_logout(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Response> {
    state.auth_service.logout(&current_user.claims).await?;

    let headers = state.session.logout_headers()?;
    Ok((StatusCode::NO_CONTENT, headers).into_response())
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = UserResponse),
        (status = 400, description = "REGISTER_USER_ALREADY_EXISTS, INVALID_PASSWORD or validation error")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = state
        .user_service
        .create(&payload.email, &payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Request a password reset token by email
#[utoipa::path(
    post,
    path = "/auth/forgot-password",
    tag = "Authentication",
    request_body = EmailRequest,
    responses(
        (status = 202, description = "Accepted whether or not the account exists")
    )
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<EmailRequest>,
) -> AppResult<StatusCode> {
    state.user_service.forgot_password(&payload.email).await?;
    Ok(StatusCode::ACCEPTED)
}

/// Reset the password with an emailed token
#[utoipa::path(
    post,
    path = "/auth/reset-password",
    tag = "Authentication",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "RESET_PASSWORD_BAD_TOKEN or INVALID_PASSWORD")
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ResetPasswordRequest>,
) -> AppResult<StatusCode> {
    state
        .user_service
        .reset_password(&payload.token, &payload.password)
        .await?;
    Ok(StatusCode::OK)
}

/// Request an email verification token
#[utoipa::path(
    post,
    path = "/auth/request-verify-token",
    tag = "Authentication",
    request_body = EmailRequest,
    responses(
        (status = 202, description = "Accepted whether or not a token was sent")
    )
)]
pub async fn request_verify_token(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<EmailRequest>,
) -> AppResult<StatusCode> {
    state.user_service.request_verify(&payload.email).await?;
    Ok(StatusCode::ACCEPTED)
}

/// Verify an email address with an emailed token
#[utoipa::path(
    post,
    path = "/auth/verify",
    tag = "Authentication",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "User verified", body = UserResponse),
        (status = 400, description = "VERIFY_USER_BAD_TOKEN or VERIFY_USER_ALREADY_VERIFIED")
    )
)]
pub async fn verify(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<VerifyRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state.user_service.verify(&payload.token).await?;
    Ok(Json(UserResponse::from(user)))
}
