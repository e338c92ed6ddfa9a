//! Cookie transport for session tokens.
//!
//! Login sets an `HttpOnly` cookie holding the JWT; logout overwrites it
//! with an expired one. Requests may also present the token as a bearer
//! header, which is consulted after the cookie.

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_LENGTH, COOKIE, LOCATION, SET_COOKIE},
        HeaderMap, HeaderValue,
    },
    response::{IntoResponse, Redirect, Response},
};

use crate::config::{Config, BEARER_TOKEN_PREFIX};
use crate::errors::{AppError, AppResult};

/// Session cookie attributes.
#[derive(Clone, Debug)]
pub struct SessionSettings {
    pub cookie_name: String,
    pub secure: bool,
    pub max_age: i64,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cookie_name: config.cookie_name.clone(),
            secure: config.cookie_secure,
            max_age: config.jwt_lifetime_seconds,
        }
    }

    /// `Set-Cookie` value carrying a fresh session token.
    pub fn cookie(&self, token: &str) -> AppResult<HeaderValue> {
        self.build(token, self.max_age)
    }

    /// `Set-Cookie` value that removes the session cookie.
    pub fn clear_cookie(&self) -> AppResult<HeaderValue> {
        self.build("", 0)
    }

    /// Headers of a successful login, ready for [`redirect_with`].
    pub fn login_headers(&self, token: &str) -> AppResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(SET_COOKIE, self.cookie(token)?);
        Ok(headers)
    }

    /// Headers of a logout, ready for [`redirect_with`].
    pub fn logout_headers(&self) -> AppResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(SET_COOKIE, self.clear_cookie()?);
        Ok(headers)
    }

    /// Find the session token: cookie first, then `Authorization: Bearer`.
    pub fn extract_token(&self, headers: &HeaderMap) -> Option<String> {
        self.cookie_token(headers).or_else(|| bearer_token(headers))
    }

    fn cookie_token(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| {
                let (key, val) = pair.trim().split_once('=')?;
                (key.trim() == self.cookie_name).then(|| val.trim().to_string())
            })
            .find(|token| !token.is_empty())
    }

    fn build(&self, token: &str, max_age: i64) -> AppResult<HeaderValue> {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.cookie_name, token, max_age
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie)
            .map_err(|e| AppError::internal(format!("Invalid cookie value: {}", e)))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value
        .strip_prefix(BEARER_TOKEN_PREFIX)
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// `303 See Other` to `path` carrying every header of `headers`.
///
/// Used to forward the `Set-Cookie` produced by login/logout onto the
/// redirect the browser actually receives.
pub fn redirect_with(headers: HeaderMap, path: &str) -> Response {
    let mut response = Redirect::to(path).into_response();
    let target = response.headers_mut();

    let mut last_name = None;
    for (name, value) in headers {
        if let Some(name) = name {
            last_name = Some(name);
        }
        let Some(name) = last_name.clone() else {
            continue;
        };
        if name == LOCATION || name == CONTENT_LENGTH {
            continue;
        }
        target.append(name, value);
    }

    response
}
