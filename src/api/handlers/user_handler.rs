//! User handlers.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::{require_superuser, CurrentUser};
use crate::api::AppState;
use crate::domain::{UserResponse, UserUpdate};
use crate::errors::AppResult;

/// User update request with validation
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    /// New email address
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "new@example.com")]
    pub email: Option<String>,
    /// New password
    #[schema(example = "AnotherPass123!")]
    pub password: Option<String>,
    /// Superuser only
    pub is_active: Option<bool>,
    /// Superuser only
    pub is_superuser: Option<bool>,
    /// Superuser only
    pub is_verified: Option<bool>,
}

impl From<UpdateUserRequest> for UserUpdate {
    fn from(request: UpdateUserRequest) -> Self {
        UserUpdate {
            email: request.email,
            password: request.password,
            is_active: request.is_active,
            is_superuser: request.is_superuser,
            is_verified: request.is_verified,
        }
    }
}

/// Greeting returned by the protected route
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Hello user@example.com!")]
    pub message: String,
}

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_current_user).patch(update_current_user))
        .route("/:id", get(get_user).patch(update_user).delete(delete_user))
}

/// Get current authenticated user
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "Users",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user profile", body = UserResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_current_user(
    Extension(current_user): Extension<CurrentUser>,
) -> Json<UserResponse> {
    Json(UserResponse::from(current_user.user))
}

/// Update own profile (email and password only)
#[utoipa::path(
    patch,
    path = "/users/me",
    tag = "Users",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = UserResponse),
        (status = 400, description = "UPDATE_USER_EMAIL_ALREADY_EXISTS, INVALID_PASSWORD or validation error"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn update_current_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .user_service
        .update(current_user.user.id, payload.into(), true)
        .await?;

    Ok(Json(UserResponse::from(user)))
}

/// Get user by ID (superuser only)
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Superuser only"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    require_superuser(&current_user)?;
    let user = state.user_service.get(id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Update any user (superuser only)
#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "Users",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = UserResponse),
        (status = 400, description = "UPDATE_USER_EMAIL_ALREADY_EXISTS, INVALID_PASSWORD or validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Superuser only"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    require_superuser(&current_user)?;
    let user = state.user_service.update(id, payload.into(), false).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Delete user (superuser only)
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Superuser only"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_superuser(&current_user)?;
    state.user_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Greet the authenticated user
#[utoipa::path(
    get,
    path = "/authenticated-route",
    tag = "Users",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    responses(
        (status = 200, description = "Greeting", body = MessageResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn authenticated_route(
    Extension(current_user): Extension<CurrentUser>,
) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: format!("Hello {}!", current_user.user.email),
    })
}
