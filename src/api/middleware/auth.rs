//! Session authentication middleware.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::api::AppState;
use crate::errors::AppError;

pub use crate::services::CurrentUser;

/// Session authentication middleware.
///
/// Reads the session token (cookie, then bearer header), resolves it to an
/// active user and injects the `CurrentUser` into the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = state
        .session
        .extract_token(request.headers())
        .ok_or(AppError::Unauthorized)?;

    let current_user = state.auth_service.read_token(&token).await?;

    request.extensions_mut().insert(current_user);

    Ok(next.run(request).await)
}

/// Require superuser rights, returns Forbidden error otherwise.
pub fn require_superuser(current_user: &CurrentUser) -> Result<(), AppError> {
    if current_user.user.is_superuser() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
