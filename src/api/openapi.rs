//! OpenAPI documentation configuration.
//!
//! Provides Swagger UI for the JSON routes. HTML pages are not described.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{auth_handler, user_handler};
use crate::config::DEFAULT_COOKIE_NAME;
use crate::domain::{UserResponse, UserRole};

/// OpenAPI documentation for the auth portal
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Auth Portal",
        version = "0.1.0",
        description = "Email/password authentication with cookie sessions, password reset and email verification"
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        // Authentication endpoints
        auth_handler::jwt_login,
        auth_handler::jwt_logout,
        auth_handler::register,
        auth_handler::forgot_password,
        auth_handler::reset_password,
        auth_handler::request_verify_token,
        auth_handler::verify,
        // User endpoints
        user_handler::get_current_user,
        user_handler::update_current_user,
        user_handler::get_user,
        user_handler::update_user,
        user_handler::delete_user,
        user_handler::authenticated_route,
    ),
    components(
        schemas(
            UserRole,
            UserResponse,
            auth_handler::LoginForm,
            auth_handler::RegisterRequest,
            auth_handler::EmailRequest,
            auth_handler::ResetPasswordRequest,
            auth_handler::VerifyRequest,
            user_handler::UpdateUserRequest,
            user_handler::MessageResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Login, registration and account recovery"),
        (name = "Users", description = "User management operations")
    )
)]
pub struct ApiDoc;

/// Session cookie and bearer security schemes
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(DEFAULT_COOKIE_NAME))),
            );
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Session token set by /auth/jwt/login"))
                        .build(),
                ),
            );
        }
    }
}
