//! JWT strategy - issues and decodes the three kinds of tokens.
//!
//! Session, password-reset and email-verification tokens are all HS256
//! JWTs signed with the same secret. They are told apart by audience, so
//! a token minted for one purpose is rejected everywhere else.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::Error as JwtError, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{
    Config, AUDIENCE_AUTH, AUDIENCE_RESET_PASSWORD, AUDIENCE_VERIFY, TOKEN_TYPE_BEARER,
};
use crate::domain::User;
use crate::errors::AppResult;

/// Session token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    /// Token id, the key of the revocation list
    pub jti: Uuid,
}

impl Claims {
    /// Seconds until the token expires (zero once expired).
    pub fn remaining_seconds(&self) -> u64 {
        (self.exp - Utc::now().timestamp()).max(0) as u64
    }
}

/// Password reset token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetClaims {
    pub sub: Uuid,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub password_fgpt: String,
}

/// Email verification token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyClaims {
    pub sub: Uuid,
    pub email: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Token response returned after successful authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// JWT access token
    pub access_token: String,
    /// Token type (always "bearer")
    pub token_type: String,
    /// Token expiration time in seconds
    pub expires_in: i64,
}

/// Signs and verifies tokens for every audience.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_lifetime: i64,
    reset_lifetime: i64,
    verify_lifetime: i64,
}

impl TokenIssuer {
    pub fn new(config: &Config) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret_bytes()),
            access_lifetime: config.jwt_lifetime_seconds,
            reset_lifetime: config.reset_token_lifetime_seconds,
            verify_lifetime: config.verify_token_lifetime_seconds,
        }
    }

    /// Mint a session token for `user`.
    pub fn issue_access(&self, user: &User) -> AppResult<TokenResponse> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            aud: AUDIENCE_AUTH.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.access_lifetime)).timestamp(),
            jti: Uuid::new_v4(),
        };

        Ok(TokenResponse {
            access_token: self.encode(&claims)?,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: self.access_lifetime,
        })
    }

    pub fn decode_access(&self, token: &str) -> Result<Claims, JwtError> {
        self.decode(token, AUDIENCE_AUTH)
    }

    /// Mint a password reset token bound to the current password fingerprint.
    pub fn issue_reset(&self, user: &User, password_fgpt: String) -> AppResult<String> {
        let now = Utc::now();
        self.encode(&ResetClaims {
            sub: user.id,
            aud: AUDIENCE_RESET_PASSWORD.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.reset_lifetime)).timestamp(),
            password_fgpt,
        })
    }

    pub fn decode_reset(&self, token: &str) -> Result<ResetClaims, JwtError> {
        self.decode(token, AUDIENCE_RESET_PASSWORD)
    }

    /// Mint an email verification token for the user's current email.
    pub fn issue_verify(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        self.encode(&VerifyClaims {
            sub: user.id,
            email: user.email.clone(),
            aud: AUDIENCE_VERIFY.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.verify_lifetime)).timestamp(),
        })
    }

    pub fn decode_verify(&self, token: &str) -> Result<VerifyClaims, JwtError> {
        self.decode(token, AUDIENCE_VERIFY)
    }

    fn encode<T: Serialize>(&self, claims: &T) -> AppResult<String> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)?)
    }

    fn decode<T: DeserializeOwned>(&self, token: &str, audience: &str) -> Result<T, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[audience]);
        validation.leeway = 0;

        decode::<T>(token, &self.decoding_key, &validation).map(|data| data.claims)
    }
}
