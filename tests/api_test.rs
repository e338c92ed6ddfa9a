//! Integration tests for the HTTP surface.
//!
//! Requests go through the full router over an in-memory SQLite
//! database, so pages, cookies, redirects and JSON errors are exercised
//! exactly as a browser or API client sees them.

mod common;

use axum::http::{header::AUTHORIZATION, Method, StatusCode};
use axum::{body::Body, http::Request};
use serde_json::json;

use auth_portal::config::{MSG_LOGIN_FAILED, MSG_USER_ALREADY_EXISTS};
use common::{
    body_json, body_text, credentials, error_code, location, session_cookie, set_cookie,
    test_config, TestApp, PASSWORD,
};

// =============================================================================
// Pages
// =============================================================================

#[tokio::test]
async fn test_index_redirects_anonymous_visitor_to_login() {
    let app = TestApp::new().await;

    let response = app.get("/", None).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response).as_deref(), Some("/my-login"));
}

#[tokio::test]
async fn test_login_page_renders_form() {
    let app = TestApp::new().await;

    let response = app.get("/my-login", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(r#"action="/my-login""#));
    assert!(!html.contains(MSG_LOGIN_FAILED));
}

#[tokio::test]
async fn test_register_page_creates_account_and_shows_login() {
    let app = TestApp::new().await;

    let response = app
        .post_form("/register", &credentials("alice@example.com", PASSWORD), None)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(r#"action="/my-login""#));

    app.login("alice@example.com", PASSWORD).await;
}

#[tokio::test]
async fn test_register_page_duplicate_email() {
    let app = TestApp::new().await;
    app.register("alice@example.com", PASSWORD).await;

    let response = app
        .post_form("/register", &credentials("alice@example.com", PASSWORD), None)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(MSG_USER_ALREADY_EXISTS));
}

#[tokio::test]
async fn test_register_page_rejects_bad_email() {
    let app = TestApp::new().await;

    let response = app
        .post_form("/register", &credentials("not-an-email", PASSWORD), None)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Invalid email format"));
}

#[tokio::test]
async fn test_register_page_rejects_short_password() {
    let app = TestApp::new().await;

    let response = app
        .post_form("/register", &credentials("alice@example.com", "short"), None)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Password should be"));
}

#[tokio::test]
async fn test_login_sets_cookie_and_redirects_home() {
    let app = TestApp::new().await;
    app.register("alice@example.com", PASSWORD).await;

    let response = app
        .post_form("/my-login", &credentials("alice@example.com", PASSWORD), None)
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/"));

    let header = set_cookie(&response).unwrap();
    assert!(header.starts_with("auth_portal_session="));
    assert!(header.contains("HttpOnly"));
    assert!(header.contains("Max-Age=3600"));
}

#[tokio::test]
async fn test_index_greets_logged_in_user() {
    let app = TestApp::new().await;
    app.register("alice@example.com", PASSWORD).await;
    let cookie = app.login("alice@example.com", PASSWORD).await;

    let response = app.get("/", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("alice@example.com"));
}

#[tokio::test]
async fn test_login_page_redirects_logged_in_user() {
    let app = TestApp::new().await;
    app.register("alice@example.com", PASSWORD).await;
    let cookie = app.login("alice@example.com", PASSWORD).await;

    let response = app.get("/my-login", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/"));
}

#[tokio::test]
async fn test_login_with_wrong_password_shows_message() {
    let app = TestApp::new().await;
    app.register("alice@example.com", PASSWORD).await;

    let response = app
        .post_form("/my-login", &credentials("alice@example.com", "WrongHorse42"), None)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(session_cookie(&response).is_none());
    assert!(body_text(response).await.contains(MSG_LOGIN_FAILED));
}

#[tokio::test]
async fn test_login_with_unknown_email_shows_message() {
    let app = TestApp::new().await;

    let response = app
        .post_form("/my-login", &credentials("ghost@example.com", PASSWORD), None)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(MSG_LOGIN_FAILED));
}

#[tokio::test]
async fn test_logout_clears_cookie_and_revokes_token() {
    let app = TestApp::new().await;
    app.register("alice@example.com", PASSWORD).await;
    let cookie = app.login("alice@example.com", PASSWORD).await;

    let response = app.post_form("/logout", "", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/my-login"));
    assert!(set_cookie(&response).unwrap().contains("Max-Age=0"));

    // The old cookie no longer opens a session
    let response = app.get("/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let response = app.get("/users/me", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/"));
}

#[tokio::test]
async fn test_logout_without_session_redirects_home() {
    let app = TestApp::new().await;

    let response = app.post_form("/logout", "", None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/"));
}

#[tokio::test]
async fn test_unknown_route_redirects_home() {
    let app = TestApp::new().await;

    let response = app.get("/does-not-exist", None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/"));
}

#[tokio::test]
async fn test_tampered_cookie_is_anonymous() {
    let app = TestApp::new().await;

    let response = app
        .get("/", Some("auth_portal_session=not.a.token"))
        .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response).as_deref(), Some("/my-login"));
}

// =============================================================================
// JSON authentication routes
// =============================================================================

#[tokio::test]
async fn test_register_returns_public_fields() {
    let app = TestApp::new().await;

    let body = app.register("Alice@Example.com", PASSWORD).await;

    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["is_active"], true);
    assert_eq!(body["is_superuser"], false);
    assert_eq!(body["is_verified"], false);
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_ignores_privileged_fields() {
    let app = TestApp::new().await;

    let response = app
        .post_json(
            "/auth/register",
            json!({
                "email": "alice@example.com",
                "password": PASSWORD,
                "is_superuser": true,
                "is_verified": true
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["is_superuser"], false);
    assert_eq!(body["is_verified"], false);
}

#[tokio::test]
async fn test_register_duplicate_is_rejected() {
    let app = TestApp::new().await;
    app.register("alice@example.com", PASSWORD).await;

    let response = app
        .post_json(
            "/auth/register",
            json!({ "email": "alice@example.com", "password": PASSWORD }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "REGISTER_USER_ALREADY_EXISTS");
}

#[tokio::test]
async fn test_register_password_containing_email() {
    let app = TestApp::new().await;

    let response = app
        .post_json(
            "/auth/register",
            json!({ "email": "a@b.co", "password": "xxa@b.coxx" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "INVALID_PASSWORD");
}

#[tokio::test]
async fn test_jwt_login_sets_cookie() {
    let app = TestApp::new().await;
    app.register("alice@example.com", PASSWORD).await;

    let response = app
        .post_form(
            "/auth/jwt/login",
            &format!("username=alice%40example.com&password={}", PASSWORD),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookie = session_cookie(&response).unwrap();

    let response = app.get("/users/me", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["email"], "alice@example.com");
}

#[tokio::test]
async fn test_jwt_login_bad_credentials() {
    let app = TestApp::new().await;
    app.register("alice@example.com", PASSWORD).await;

    let response = app
        .post_form(
            "/auth/jwt/login",
            "username=alice%40example.com&password=WrongHorse42",
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "LOGIN_BAD_CREDENTIALS");
}

#[tokio::test]
async fn test_jwt_login_missing_field() {
    let app = TestApp::new().await;

    let response = app
        .post_form("/auth/jwt/login", "username=alice%40example.com", None)
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_jwt_logout_revokes_token() {
    let app = TestApp::new().await;
    app.register("alice@example.com", PASSWORD).await;
    let cookie = app.login("alice@example.com", PASSWORD).await;

    let response = app.post_form("/auth/jwt/logout", "", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(set_cookie(&response).unwrap().contains("Max-Age=0"));

    let response = app.post_form("/auth/jwt/logout", "", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_unverified_login_refused_when_required() {
    let mut config = test_config();
    config.require_verified_login = true;
    let app = TestApp::with_config(config).await;
    app.register("alice@example.com", PASSWORD).await;

    let response = app
        .post_form(
            "/auth/jwt/login",
            &format!("username=alice%40example.com&password={}", PASSWORD),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "LOGIN_USER_NOT_VERIFIED");

    let response = app
        .post_form("/my-login", &credentials("alice@example.com", PASSWORD), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(MSG_LOGIN_FAILED));
}

// =============================================================================
// Account recovery
// =============================================================================

#[tokio::test]
async fn test_forgot_and_reset_password() {
    let app = TestApp::new().await;
    app.register("alice@example.com", PASSWORD).await;

    let response = app
        .post_json("/auth/forgot-password", json!({ "email": "alice@example.com" }))
        .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let token = app.mailer.last_token_for("alice@example.com");
    let response = app
        .post_json(
            "/auth/reset-password",
            json!({ "token": token, "password": "BatteryStaple99" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Old password is gone, new one works
    let response = app
        .post_form("/my-login", &credentials("alice@example.com", PASSWORD), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    app.login("alice@example.com", "BatteryStaple99").await;

    // The token is single use
    let response = app
        .post_json(
            "/auth/reset-password",
            json!({ "token": token, "password": "AnotherOne123" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "RESET_PASSWORD_BAD_TOKEN");
}

#[tokio::test]
async fn test_forgot_password_unknown_email_is_accepted() {
    let app = TestApp::new().await;

    let response = app
        .post_json("/auth/forgot-password", json!({ "email": "ghost@example.com" }))
        .await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_reset_password_with_garbage_token() {
    let app = TestApp::new().await;

    let response = app
        .post_json(
            "/auth/reset-password",
            json!({ "token": "garbage", "password": "BatteryStaple99" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "RESET_PASSWORD_BAD_TOKEN");
}

#[tokio::test]
async fn test_request_verify_and_verify() {
    let app = TestApp::new().await;
    app.register("alice@example.com", PASSWORD).await;

    let response = app
        .post_json(
            "/auth/request-verify-token",
            json!({ "email": "alice@example.com" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let token = app.mailer.last_token_for("alice@example.com");
    let response = app.post_json("/auth/verify", json!({ "token": token })).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["is_verified"], true);

    let response = app.post_json("/auth/verify", json!({ "token": token })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "VERIFY_USER_ALREADY_VERIFIED");
}

#[tokio::test]
async fn test_verify_with_reset_token_is_rejected() {
    let app = TestApp::new().await;
    app.register("alice@example.com", PASSWORD).await;
    app.post_json("/auth/forgot-password", json!({ "email": "alice@example.com" }))
        .await;
    let reset_token = app.mailer.last_token_for("alice@example.com");

    let response = app
        .post_json("/auth/verify", json!({ "token": reset_token }))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "VERIFY_USER_BAD_TOKEN");
}

#[tokio::test]
async fn test_registration_sends_verification_when_enabled() {
    let mut config = test_config();
    config.send_verification_on_register = true;
    let app = TestApp::with_config(config).await;

    app.register("alice@example.com", PASSWORD).await;

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "alice@example.com");
}

// =============================================================================
// Users
// =============================================================================

#[tokio::test]
async fn test_users_me_requires_session() {
    let app = TestApp::new().await;

    let response = app.get("/users/me", None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/"));
}

#[tokio::test]
async fn test_users_me_accepts_bearer_token() {
    let app = TestApp::new().await;
    app.register("alice@example.com", PASSWORD).await;
    let cookie = app.login("alice@example.com", PASSWORD).await;
    let token = cookie.split_once('=').unwrap().1.to_string();

    let request = Request::builder()
        .uri("/users/me")
        .header(AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_update_me_ignores_privileged_fields() {
    let app = TestApp::new().await;
    app.register("alice@example.com", PASSWORD).await;
    let cookie = app.login("alice@example.com", PASSWORD).await;

    let response = app
        .json(
            Method::PATCH,
            "/users/me",
            json!({ "is_superuser": true, "is_verified": true }),
            Some(&cookie),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["is_superuser"], false);
    assert_eq!(body["is_verified"], false);
}

#[tokio::test]
async fn test_update_me_email_to_taken_address() {
    let app = TestApp::new().await;
    app.register("alice@example.com", PASSWORD).await;
    app.register("bob@example.com", PASSWORD).await;
    let cookie = app.login("alice@example.com", PASSWORD).await;

    let response = app
        .json(
            Method::PATCH,
            "/users/me",
            json!({ "email": "bob@example.com" }),
            Some(&cookie),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "UPDATE_USER_EMAIL_ALREADY_EXISTS");
}

#[tokio::test]
async fn test_user_by_id_is_superuser_only() {
    let app = TestApp::new().await;
    let alice = app.register("alice@example.com", PASSWORD).await;
    let cookie = app.login("alice@example.com", PASSWORD).await;

    let response = app
        .get(&format!("/users/{}", alice["id"].as_str().unwrap()), Some(&cookie))
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_superuser_manages_other_users() {
    let app = TestApp::new().await;
    app.register("admin@example.com", PASSWORD).await;
    let bob = app.register("bob@example.com", PASSWORD).await;
    let bob_path = format!("/users/{}", bob["id"].as_str().unwrap());

    app.state
        .user_service
        .promote("admin@example.com")
        .await
        .unwrap();
    let cookie = app.login("admin@example.com", PASSWORD).await;

    let response = app.get(&bob_path, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["email"], "bob@example.com");

    let response = app
        .json(
            Method::PATCH,
            &bob_path,
            json!({ "is_verified": true }),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["is_verified"], true);

    let request = Request::builder()
        .method(Method::DELETE)
        .uri(&bob_path)
        .header("cookie", &cookie)
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(request).await.status(), StatusCode::NO_CONTENT);

    // Missing users surface as a redirect like every 404
    let response = app.get(&bob_path, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_deactivated_user_loses_session() {
    let app = TestApp::new().await;
    app.register("admin@example.com", PASSWORD).await;
    let bob = app.register("bob@example.com", PASSWORD).await;
    app.state
        .user_service
        .promote("admin@example.com")
        .await
        .unwrap();
    let admin = app.login("admin@example.com", PASSWORD).await;
    let session = app.login("bob@example.com", PASSWORD).await;

    let response = app
        .json(
            Method::PATCH,
            &format!("/users/{}", bob["id"].as_str().unwrap()),
            json!({ "is_active": false }),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get("/users/me", Some(&session)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app
        .post_form("/my-login", &credentials("bob@example.com", PASSWORD), None)
        .await;
    assert!(body_text(response).await.contains(MSG_LOGIN_FAILED));
}

#[tokio::test]
async fn test_authenticated_route_greets_user() {
    let app = TestApp::new().await;
    app.register("alice@example.com", PASSWORD).await;
    let cookie = app.login("alice@example.com", PASSWORD).await;

    let response = app.get("/authenticated-route", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["message"],
        "Hello alice@example.com!"
    );
}

// =============================================================================
// Infrastructure
// =============================================================================

#[tokio::test]
async fn test_health_reports_backends() {
    let app = TestApp::new().await;

    let response = app.get("/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["cache"]["backend"], "memory");
}

#[tokio::test]
async fn test_auth_routes_are_rate_limited() {
    let mut config = test_config();
    config.rate_limit_auth_requests = 2;
    let app = TestApp::with_config(config).await;

    for _ in 0..2 {
        let response = app
            .post_json("/auth/forgot-password", json!({ "email": "a@example.com" }))
            .await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    let response = app
        .post_json("/auth/forgot-password", json!({ "email": "a@example.com" }))
        .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("Retry-After"));
}

#[tokio::test]
async fn test_spoofed_forwarding_headers_share_one_budget() {
    let mut config = test_config();
    config.rate_limit_auth_requests = 2;
    let app = TestApp::with_config(config).await;

    let mut statuses = Vec::new();
    for i in 0..3 {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/auth/forgot-password")
            .header("content-type", "application/json")
            .header("X-Forwarded-For", format!("203.0.113.{}", i))
            .header("X-Real-IP", format!("198.51.100.{}", i))
            .body(Body::from(json!({ "email": "a@example.com" }).to_string()))
            .unwrap();
        statuses.push(app.send(request).await.status());
    }

    assert_eq!(
        statuses,
        vec![
            StatusCode::ACCEPTED,
            StatusCode::ACCEPTED,
            StatusCode::TOO_MANY_REQUESTS
        ]
    );
}
