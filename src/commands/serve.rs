//! Serve command - Starts the HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::api::{create_router, AppState};
use crate::cli::args::ServeArgs;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::{Cache, CacheStore, Database, MemoryCache};
use crate::jobs::{EmailJob, InlineMailer, Mailer, QueuedMailer};

/// Execute the serve command
pub async fn execute(args: ServeArgs, mut config: Config) -> AppResult<()> {
    tracing::info!("Starting server...");

    // Connects and applies pending migrations
    let db = Arc::new(Database::connect(&config).await?);

    let cache = connect_cache(&config).await?;
    let mailer = build_mailer(&config).await?;

    let app_state = AppState::from_config(db, cache, mailer, &config);
    let app = create_router(app_state);

    if let Some(host) = args.host {
        config.server_host = host;
    }
    if let Some(port) = args.port {
        config.server_port = port;
    }
    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Server running on http://{}", addr);

    // Connection info feeds the per-client rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    Ok(())
}

async fn connect_cache(config: &Config) -> AppResult<Arc<dyn CacheStore>> {
    match &config.redis_url {
        Some(url) => {
            let cache = Cache::try_connect(url)
                .await
                .map_err(|e| AppError::internal(format!("Failed to connect to Redis: {}", e)))?;
            Ok(Arc::new(cache))
        }
        None => {
            tracing::warn!("REDIS_URL not set, using in-process cache");
            Ok(Arc::new(MemoryCache::new()))
        }
    }
}

async fn build_mailer(config: &Config) -> AppResult<Arc<dyn Mailer>> {
    if !config.email_queue {
        tracing::info!("Emails are delivered inline");
        return Ok(Arc::new(InlineMailer));
    }

    use apalis_sql::postgres::PostgresStorage;
    use apalis_sql::sqlx::postgres::PgPoolOptions;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .map_err(|e| AppError::internal(format!("Failed to connect to job queue: {}", e)))?;

    PostgresStorage::setup(&pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to setup job storage: {}", e)))?;

    let storage: PostgresStorage<EmailJob> = PostgresStorage::new(pool);
    tracing::info!("Emails are queued for the job worker");

    Ok(Arc::new(QueuedMailer::new(storage)))
}
