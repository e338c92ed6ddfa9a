//! Background jobs and email dispatch.
//!
//! The user manager hands emails to a [`Mailer`]. `QueuedMailer` pushes
//! them onto the apalis Postgres queue drained by `jobs work`;
//! `InlineMailer` runs the job handler in-process.

mod email_job;

use async_trait::async_trait;
use apalis::prelude::Storage;
use apalis_sql::postgres::PostgresStorage;

use crate::errors::{AppError, AppResult};

pub use email_job::{email_job_handler, EmailJob};

#[cfg(test)]
use mockall::automock;

/// Outgoing email dispatch.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, job: EmailJob) -> AppResult<()>;
}

/// Runs the email job immediately.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineMailer;

#[async_trait]
impl Mailer for InlineMailer {
    async fn send(&self, job: EmailJob) -> AppResult<()> {
        email_job_handler(job).await
    }
}

/// Enqueues email jobs for the background worker.
#[derive(Clone)]
pub struct QueuedMailer {
    storage: PostgresStorage<EmailJob>,
}

impl QueuedMailer {
    pub fn new(storage: PostgresStorage<EmailJob>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl Mailer for QueuedMailer {
    async fn send(&self, job: EmailJob) -> AppResult<()> {
        let mut storage = self.storage.clone();
        let to = job.to.clone();

        storage
            .push(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to enqueue email: {}", e)))?;

        tracing::debug!(to = %to, "Email job enqueued");
        Ok(())
    }
}
