//! Optional session extractor for HTML pages.

use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::errors::AppError;

/// The signed-in user, if the request carries a valid session.
///
/// Pages branch on this instead of rejecting anonymous visitors.
pub struct MaybeUser(pub Option<CurrentUser>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(current_user) = parts.extensions.get::<CurrentUser>() {
            return Ok(MaybeUser(Some(current_user.clone())));
        }

        let Some(token) = state.session.extract_token(&parts.headers) else {
            return Ok(MaybeUser(None));
        };

        match state.auth_service.read_token(&token).await {
            Ok(current_user) => Ok(MaybeUser(Some(current_user))),
            Err(AppError::Unauthorized) => Ok(MaybeUser(None)),
            Err(e) => {
                tracing::warn!(error = %e, "Session lookup failed, treating as anonymous");
                Ok(MaybeUser(None))
            }
        }
    }
}
