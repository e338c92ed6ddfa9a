//! Application settings loaded from environment variables.

use std::env;
use std::str::FromStr;

use super::constants::{
    DEFAULT_COOKIE_NAME, DEFAULT_DATABASE_URL, DEFAULT_JWT_LIFETIME_SECONDS,
    DEFAULT_PUBLIC_BASE_URL, DEFAULT_RESET_TOKEN_LIFETIME_SECONDS, DEFAULT_SERVER_HOST,
    DEFAULT_SERVER_PORT, DEFAULT_VERIFY_TOKEN_LIFETIME_SECONDS, MIN_JWT_SECRET_LENGTH,
    RATE_LIMIT_AUTH_REQUESTS, RATE_LIMIT_REQUESTS,
};
use crate::errors::{AppError, AppResult};

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    /// Redis connection URL; the in-process cache is used when unset
    pub redis_url: Option<String>,
    jwt_secret: String,
    pub jwt_lifetime_seconds: i64,
    pub reset_token_lifetime_seconds: i64,
    pub verify_token_lifetime_seconds: i64,
    pub cookie_name: String,
    pub cookie_secure: bool,
    /// Refuse logins of users that have not verified their email
    pub require_verified_login: bool,
    /// Send a verification email right after registration
    pub send_verification_on_register: bool,
    pub public_base_url: String,
    /// Deliver emails through the apalis queue instead of inline
    pub email_queue: bool,
    pub rate_limit_requests: u64,
    pub rate_limit_auth_requests: u64,
    /// Key rate limits on `X-Forwarded-For`/`X-Real-IP`; only safe behind a proxy
    pub trust_proxy_headers: bool,
    pub server_host: String,
    pub server_port: u16,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("redis_url", &self.redis_url.as_ref().map(|_| "[REDACTED]"))
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_lifetime_seconds", &self.jwt_lifetime_seconds)
            .field("cookie_name", &self.cookie_name)
            .field("cookie_secure", &self.cookie_secure)
            .field("require_verified_login", &self.require_verified_login)
            .field("email_queue", &self.email_queue)
            .field("trust_proxy_headers", &self.trust_proxy_headers)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .finish()
    }
}

impl Config {
    /// Build a configuration with default values around the given secret.
    ///
    /// # Errors
    /// Returns a validation error if the secret is shorter than
    /// `MIN_JWT_SECRET_LENGTH`.
    pub fn new(jwt_secret: impl Into<String>) -> AppResult<Self> {
        let jwt_secret = jwt_secret.into();
        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(AppError::validation(format!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            )));
        }

        Ok(Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            redis_url: None,
            jwt_secret,
            jwt_lifetime_seconds: DEFAULT_JWT_LIFETIME_SECONDS,
            reset_token_lifetime_seconds: DEFAULT_RESET_TOKEN_LIFETIME_SECONDS,
            verify_token_lifetime_seconds: DEFAULT_VERIFY_TOKEN_LIFETIME_SECONDS,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            cookie_secure: false,
            require_verified_login: false,
            send_verification_on_register: false,
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            email_queue: false,
            rate_limit_requests: RATE_LIMIT_REQUESTS,
            rate_limit_auth_requests: RATE_LIMIT_AUTH_REQUESTS,
            trust_proxy_headers: false,
            server_host: DEFAULT_SERVER_HOST.to_string(),
            server_port: DEFAULT_SERVER_PORT,
        })
    }

    /// Load configuration from environment variables (and `.env`).
    ///
    /// In debug builds a missing `JWT_SECRET` falls back to an insecure
    /// development value; release builds refuse to start without it.
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) if cfg!(debug_assertions) => {
                tracing::warn!("JWT_SECRET not set, using insecure default for development");
                "dev-secret-key-minimum-32-chars!!".to_string()
            }
            Err(_) => {
                return Err(AppError::validation(
                    "JWT_SECRET environment variable must be set in production",
                ))
            }
        };

        let mut config = Self::new(jwt_secret)?;

        if let Ok(url) = env::var("DATABASE_URL") {
            config.database_url = url;
        }
        config.redis_url = env::var("REDIS_URL").ok().filter(|url| !url.is_empty());
        config.jwt_lifetime_seconds = env_parse("JWT_LIFETIME_SECONDS", config.jwt_lifetime_seconds);
        config.reset_token_lifetime_seconds = env_parse(
            "RESET_TOKEN_LIFETIME_SECONDS",
            config.reset_token_lifetime_seconds,
        );
        config.verify_token_lifetime_seconds = env_parse(
            "VERIFY_TOKEN_LIFETIME_SECONDS",
            config.verify_token_lifetime_seconds,
        );
        if let Ok(name) = env::var("AUTH_COOKIE_NAME") {
            config.cookie_name = name;
        }
        config.cookie_secure = env_flag("AUTH_COOKIE_SECURE", config.cookie_secure);
        config.require_verified_login =
            env_flag("REQUIRE_VERIFIED_LOGIN", config.require_verified_login);
        config.send_verification_on_register = env_flag(
            "SEND_VERIFICATION_ON_REGISTER",
            config.send_verification_on_register,
        );
        if let Ok(url) = env::var("PUBLIC_BASE_URL") {
            config.public_base_url = url.trim_end_matches('/').to_string();
        }
        config.email_queue = env_flag("EMAIL_QUEUE", config.email_queue);
        config.rate_limit_requests = env_parse("RATE_LIMIT_REQUESTS", config.rate_limit_requests);
        config.rate_limit_auth_requests =
            env_parse("RATE_LIMIT_AUTH_REQUESTS", config.rate_limit_auth_requests);
        config.trust_proxy_headers = env_flag("TRUST_PROXY_HEADERS", config.trust_proxy_headers);
        if let Ok(host) = env::var("SERVER_HOST") {
            config.server_host = host;
        }
        config.server_port = env_parse("SERVER_PORT", config.server_port);

        Ok(config)
    }

    /// Get JWT secret bytes for token signing/verification.
    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
