//! Browser-facing error redirects.

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

/// Turn every 401 and 404 response into `303 See Other` to the landing page.
pub async fn redirect_to_root(request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    match response.status() {
        StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND => {
            tracing::debug!(status = %response.status(), "Redirecting to landing page");
            Redirect::to("/").into_response()
        }
        _ => response,
    }
}
