//! Email background job.
//!
//! Account emails (password reset, verification) travel as `EmailJob`
//! payloads. Delivery is logged; an SMTP relay is only described by the
//! `SMTP_*` environment variables and reported in the log.

use serde::{Deserialize, Serialize};
use std::env;

use crate::errors::AppError;

/// Email job payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailJob {
    /// Recipient email address
    pub to: String,
    /// Email subject line
    pub subject: String,
    /// Plain text body
    pub body: String,
    /// Optional sender override (defaults to SMTP_FROM)
    #[serde(default)]
    pub from: Option<String>,
}

impl EmailJob {
    /// Create a new email job
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            from: None,
        }
    }

    /// Password reset instructions carrying `token`.
    pub fn reset_password(to: &str, token: &str, base_url: &str) -> Self {
        Self::new(
            to,
            "Reset your password",
            format!(
                "Someone asked to reset the password of this account.\n\n\
                 Send the token below with your new password to {}/auth/reset-password:\n\n\
                 {}\n\n\
                 If this was not you, ignore this message.",
                base_url, token
            ),
        )
    }

    /// Email verification instructions carrying `token`.
    pub fn verify_email(to: &str, token: &str, base_url: &str) -> Self {
        Self::new(
            to,
            "Verify your email address",
            format!(
                "Confirm this address by sending the token below to {}/auth/verify:\n\n{}",
                base_url, token
            ),
        )
    }

    /// Set custom sender address
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }
}

/// SMTP settings read from the environment.
struct EmailConfig {
    smtp_host: Option<String>,
    smtp_port: u16,
    smtp_from: String,
}

impl EmailConfig {
    fn from_env() -> Self {
        Self {
            smtp_host: env::var("SMTP_HOST").ok(),
            smtp_port: env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            smtp_from: env::var("SMTP_FROM").unwrap_or_else(|_| "noreply@example.com".to_string()),
        }
    }
}

/// Email job handler - processes email sending jobs
pub async fn email_job_handler(job: EmailJob) -> Result<(), AppError> {
    let config = EmailConfig::from_env();
    let from = job.from.as_deref().unwrap_or(&config.smtp_from);

    tracing::info!(
        to = %job.to,
        from = %from,
        subject = %job.subject,
        "Processing email job"
    );

    match &config.smtp_host {
        Some(host) => tracing::info!(
            relay = %format!("{}:{}", host, config.smtp_port),
            "SMTP relay configured; message logged only"
        ),
        None => tracing::debug!("SMTP not configured"),
    }

    tracing::info!(
        "=== EMAIL ===\n\
         From: {}\n\
         To: {}\n\
         Subject: {}\n\
         Body:\n{}\n\
         =============",
        from,
        job.to,
        job.subject,
        job.body
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_email_carries_token() {
        let job = EmailJob::reset_password("a@example.com", "tok-123", "http://localhost:3000");
        assert_eq!(job.to, "a@example.com");
        assert!(job.body.contains("tok-123"));
        assert!(job.body.contains("http://localhost:3000/auth/reset-password"));
    }

    #[test]
    fn test_payload_round_trips_without_sender() {
        let json = r#"{"to":"a@example.com","subject":"s","body":"b"}"#;
        let job: EmailJob = serde_json::from_str(json).unwrap();
        assert!(job.from.is_none());
        assert_eq!(job.with_from("x@example.com").from.as_deref(), Some("x@example.com"));
    }

    #[tokio::test]
    async fn test_handler_accepts_job() {
        let job = EmailJob::verify_email("a@example.com", "tok", "http://localhost:3000");
        assert!(email_job_handler(job).await.is_ok());
    }
}
