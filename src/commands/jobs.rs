//! Jobs command - Email queue management.
//!
//! - `work`: drain the email queue
//! - `list`: show job counts per status
//! - `clear`: remove failed jobs
//!
//! The queue lives in the `apalis` schema of the application database and
//! is only used when `EMAIL_QUEUE` is enabled.

use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement};

use crate::cli::args::{JobsAction, JobsArgs};
use crate::config::{Config, JOB_NAME_EMAIL};
use crate::errors::{AppError, AppResult};

/// Execute the jobs command
pub async fn execute(args: JobsArgs, config: Config) -> AppResult<()> {
    match args.action {
        JobsAction::Work => run_worker(&config).await,
        JobsAction::List => list_jobs(&config).await,
        JobsAction::Clear => clear_failed_jobs(&config).await,
    }
}

/// Start the email worker; stops on Ctrl+C.
async fn run_worker(config: &Config) -> AppResult<()> {
    use apalis::prelude::*;
    use apalis_sql::postgres::PostgresStorage;
    use apalis_sql::sqlx::postgres::PgPoolOptions;

    use crate::jobs::{email_job_handler, EmailJob};

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .map_err(|e| AppError::internal(format!("Failed to connect to database: {}", e)))?;

    PostgresStorage::setup(&pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to setup job storage: {}", e)))?;

    let email_storage: PostgresStorage<EmailJob> = PostgresStorage::new(pool);

    let worker = WorkerBuilder::new(JOB_NAME_EMAIL)
        .backend(email_storage)
        .build_fn(email_job_handler);

    let monitor = Monitor::new().register(worker);

    tracing::info!("Email worker started. Press Ctrl+C to stop.");

    tokio::select! {
        result = monitor.run() => {
            if let Err(e) = result {
                tracing::error!("Worker error: {}", e);
                return Err(AppError::internal(format!("Worker failed: {}", e)));
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping worker...");
        }
    }

    tracing::info!("Email worker stopped.");
    Ok(())
}

/// Connect to the queue database; `None` when the queue was never set up.
async fn queue_connection(config: &Config) -> AppResult<Option<DatabaseConnection>> {
    let db = sea_orm::Database::connect(&config.database_url).await?;

    let row = db
        .query_one(Statement::from_string(
            DatabaseBackend::Postgres,
            "SELECT EXISTS(SELECT 1 FROM information_schema.schemata WHERE schema_name = 'apalis') AS exists",
        ))
        .await?;

    let exists = row
        .and_then(|r| r.try_get::<bool>("", "exists").ok())
        .unwrap_or(false);

    Ok(exists.then_some(db))
}

/// Print job counts per status
async fn list_jobs(config: &Config) -> AppResult<()> {
    let Some(db) = queue_connection(config).await? else {
        println!("Email queue not initialized. Run 'jobs work' or serve with EMAIL_QUEUE=true.");
        return Ok(());
    };

    let rows = db
        .query_all(Statement::from_string(
            DatabaseBackend::Postgres,
            "SELECT status::text AS status, COUNT(*)::bigint AS count FROM apalis.jobs GROUP BY status ORDER BY status",
        ))
        .await?;

    println!("\n=== Email Queue ===");
    if rows.is_empty() {
        println!("(empty)");
    }
    for row in rows {
        let status: String = row.try_get("", "status")?;
        let count: i64 = row.try_get("", "count")?;
        println!("{:<10}{}", format!("{}:", status), count);
    }
    println!("===================\n");

    Ok(())
}

/// Remove failed jobs from the queue
async fn clear_failed_jobs(config: &Config) -> AppResult<()> {
    let Some(db) = queue_connection(config).await? else {
        println!("Email queue not initialized. Nothing to clear.");
        return Ok(());
    };

    let result = db
        .execute(Statement::from_string(
            DatabaseBackend::Postgres,
            "DELETE FROM apalis.jobs WHERE status = 'Failed'",
        ))
        .await?;

    println!("Cleared {} failed job(s) from the queue.", result.rows_affected());
    Ok(())
}
