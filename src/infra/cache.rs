//! Cache backends.
//!
//! Rate-limit counters and the session revocation list live behind the
//! [`CacheStore`] trait. Production deployments point it at Redis; when no
//! Redis URL is configured (and in tests) an in-process moka cache is used.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::{future::Cache as MokaCache, Expiry};
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};

use crate::config::{CACHE_PREFIX_RATE_LIMIT, CACHE_PREFIX_REVOKED, MEMORY_CACHE_CAPACITY};
use crate::errors::{AppError, AppResult};

/// Operations the HTTP layer needs from a cache.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Check and increment rate limit counter.
    /// Returns (current_count, is_allowed) tuple.
    async fn check_rate_limit(
        &self,
        identifier: &str,
        max_requests: u64,
        window_seconds: u64,
    ) -> AppResult<(u64, bool)>;

    /// Mark a session token id as revoked for `ttl_seconds`.
    async fn revoke(&self, token_id: &str, ttl_seconds: u64) -> AppResult<()>;

    /// Whether a session token id has been revoked.
    async fn is_revoked(&self, token_id: &str) -> AppResult<bool>;

    /// Connectivity check used by the health endpoint.
    async fn ping(&self) -> AppResult<()>;

    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;
}

// =============================================================================
// Redis
// =============================================================================

/// Redis cache wrapper with connection pooling.
#[derive(Clone)]
pub struct Cache {
    connection: ConnectionManager,
}

impl Cache {
    /// Connect to Redis.
    pub async fn try_connect(redis_url: &str) -> Result<Self, RedisError> {
        let client = Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;

        tracing::info!("Redis cache connected");

        Ok(Self { connection })
    }
}

#[async_trait]
impl CacheStore for Cache {
    async fn check_rate_limit(
        &self,
        identifier: &str,
        max_requests: u64,
        window_seconds: u64,
    ) -> AppResult<(u64, bool)> {
        let key = format!("{}{}", CACHE_PREFIX_RATE_LIMIT, identifier);
        let mut conn = self.connection.clone();

        // INCR creates the key at 1; only that request starts the window
        let count: u64 = conn.incr(&key, 1u64).await.map_err(cache_error)?;
        if count == 1 {
            let _: () = conn
                .expire(&key, window_seconds as i64)
                .await
                .map_err(cache_error)?;
        }

        Ok((count, count <= max_requests))
    }

    async fn revoke(&self, token_id: &str, ttl_seconds: u64) -> AppResult<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }

        let key = format!("{}{}", CACHE_PREFIX_REVOKED, token_id);
        let mut conn = self.connection.clone();
        let _: () = conn
            .set_ex(&key, 1i64, ttl_seconds)
            .await
            .map_err(cache_error)?;

        Ok(())
    }

    async fn is_revoked(&self, token_id: &str) -> AppResult<bool> {
        let key = format!("{}{}", CACHE_PREFIX_REVOKED, token_id);
        let mut conn = self.connection.clone();
        let exists: bool = conn.exists(&key).await.map_err(cache_error)?;
        Ok(exists)
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(cache_error)?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

/// Convert Redis error to AppError.
fn cache_error(e: RedisError) -> AppError {
    tracing::error!("Redis error: {}", e);
    AppError::internal(format!("Cache error: {}", e))
}

// =============================================================================
// In-process
// =============================================================================

#[derive(Clone, Copy, Debug)]
struct Counter {
    count: u64,
    ttl: Duration,
}

/// Each entry expires `ttl` after it was first written; increments keep
/// the original deadline.
struct CounterExpiry;

impl Expiry<String, Counter> for CounterExpiry {
    fn expire_after_create(&self, _key: &String, value: &Counter, _now: Instant) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Revocations expire after the TTL they were stored with.
struct RevocationExpiry;

impl Expiry<String, Duration> for RevocationExpiry {
    fn expire_after_create(&self, _key: &String, ttl: &Duration, _now: Instant) -> Option<Duration> {
        Some(*ttl)
    }
}

/// In-process cache backed by moka, used when Redis is not configured.
///
/// Rate-limit counters are bounded by `max_capacity`. Revoked token ids
/// live in their own unbounded cache so counter churn never evicts them.
#[derive(Clone)]
pub struct MemoryCache {
    counters: MokaCache<String, Counter>,
    revoked: MokaCache<String, Duration>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_capacity(MEMORY_CACHE_CAPACITY)
    }

    pub fn with_capacity(max_capacity: u64) -> Self {
        let counters = MokaCache::builder()
            .max_capacity(max_capacity)
            .expire_after(CounterExpiry)
            .build();
        let revoked = MokaCache::builder().expire_after(RevocationExpiry).build();

        Self { counters, revoked }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn check_rate_limit(
        &self,
        identifier: &str,
        max_requests: u64,
        window_seconds: u64,
    ) -> AppResult<(u64, bool)> {
        let key = format!("{}{}", CACHE_PREFIX_RATE_LIMIT, identifier);
        let ttl = Duration::from_secs(window_seconds);

        let entry = self
            .counters
            .entry(key)
            .and_upsert_with(|existing| async move {
                match existing {
                    Some(entry) => {
                        let counter = entry.into_value();
                        Counter {
                            count: counter.count + 1,
                            ttl: counter.ttl,
                        }
                    }
                    None => Counter { count: 1, ttl },
                }
            })
            .await;

        let count = entry.into_value().count;
        Ok((count, count <= max_requests))
    }

    async fn revoke(&self, token_id: &str, ttl_seconds: u64) -> AppResult<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }

        let key = format!("{}{}", CACHE_PREFIX_REVOKED, token_id);
        self.revoked
            .insert(key, Duration::from_secs(ttl_seconds))
            .await;

        Ok(())
    }

    async fn is_revoked(&self, token_id: &str) -> AppResult<bool> {
        let key = format!("{}{}", CACHE_PREFIX_REVOKED, token_id);
        Ok(self.revoked.get(&key).await.is_some())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
