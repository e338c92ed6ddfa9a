//! Shared fixtures for integration tests.
//!
//! Every test gets its own in-memory SQLite database, in-process cache
//! and a mailer that records outgoing emails instead of delivering them.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        Method, Request, StatusCode,
    },
    response::Response,
    Router,
};
use tower::ServiceExt;

use auth_portal::api::{create_router, AppState};
use auth_portal::errors::AppResult;
use auth_portal::infra::{CacheStore, Database, MemoryCache};
use auth_portal::jobs::{EmailJob, Mailer};
use auth_portal::Config;

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-chars";
pub const PASSWORD: &str = "CorrectHorse42";

/// Mailer that keeps every email in memory.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailJob>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<EmailJob> {
        self.sent.lock().unwrap().clone()
    }

    /// Token carried by the most recent email sent to `to`.
    pub fn last_token_for(&self, to: &str) -> String {
        let job = self
            .sent()
            .into_iter()
            .rev()
            .find(|job| job.to == to)
            .unwrap_or_else(|| panic!("no email sent to {}", to));
        token_from_body(&job.body)
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, job: EmailJob) -> AppResult<()> {
        self.sent.lock().unwrap().push(job);
        Ok(())
    }
}

/// Tokens sit alone on their line in every account email.
pub fn token_from_body(body: &str) -> String {
    body.lines()
        .map(str::trim)
        .find(|line| line.split('.').count() == 3 && !line.contains(' ') && !line.contains('/'))
        .unwrap_or_else(|| panic!("no token in email body: {}", body))
        .to_string()
}

pub fn test_config() -> Config {
    let mut config = Config::new(TEST_SECRET).unwrap();
    config.database_url = "sqlite::memory:".to_string();
    config.rate_limit_requests = 10_000;
    config.rate_limit_auth_requests = 10_000;
    config
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let database = Arc::new(Database::connect(&config).await.unwrap());
        let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new());
        let mailer = Arc::new(RecordingMailer::default());

        let state = AppState::from_config(database, cache, mailer.clone(), &config);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            mailer,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, path: &str, form: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap())
            .await
    }

    pub async fn post_json(&self, path: &str, body: serde_json::Value) -> Response {
        self.json(Method::POST, path, body, None).await
    }

    pub async fn json(
        &self,
        method: Method,
        path: &str,
        body: serde_json::Value,
        cookie: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header(CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Register through the JSON API.
    pub async fn register(&self, email: &str, password: &str) -> serde_json::Value {
        let response = self
            .post_json(
                "/auth/register",
                serde_json::json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await
    }

    /// Log in through the page form and return the `name=value` cookie pair.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .post_form("/my-login", &credentials(email, password), None)
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        session_cookie(&response).expect("login should set the session cookie")
    }
}

pub fn credentials(email: &str, password: &str) -> String {
    format!(
        "email={}&password={}",
        email.replace('@', "%40"),
        password
    )
}

/// `name=value` of the first `Set-Cookie` header, if any.
pub fn session_cookie(response: &Response) -> Option<String> {
    let value = response.headers().get(SET_COOKIE)?.to_str().ok()?;
    value.split(';').next().map(|pair| pair.trim().to_string())
}

pub fn set_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

pub fn location(response: &Response) -> Option<String> {
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Error code of a JSON error response.
pub async fn error_code(response: Response) -> String {
    body_json(response).await["error"]["code"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}
