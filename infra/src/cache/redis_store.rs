//! Redis-backed `CacheStore`

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Script};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use tg_core::errors::{DomainError, DomainResult};
use tg_core::repositories::{CacheStore, CounterState};
use tg_shared::config::CacheConfig;

use crate::InfrastructureError;

/// INCR, set the window expiry when the key is new, report the remaining TTL
const INCREMENT_SCRIPT: &str = r#"
local count = redis.call('INCR', KEYS[1])
local ttl = redis.call('PTTL', KEYS[1])
if count == 1 or ttl < 0 then
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
    ttl = tonumber(ARGV[1])
end
return {count, ttl}
"#;

/// Delete the lock only while it still holds the caller's owner token
const RELEASE_LOCK_SCRIPT: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
end
return 0
"#;

#[derive(Clone)]
pub struct RedisCacheStore {
    connection: MultiplexedConnection,
    key_prefix: Option<String>,
    operation_timeout: Duration,
    increment_script: Script,
    release_script: Script,
}

impl RedisCacheStore {
    /// Connect, retrying up to `max_retries` times
    pub async fn connect(config: &CacheConfig) -> Result<Self, InfrastructureError> {
        let client = redis::Client::open(config.url.as_str())?;
        let connect_timeout = Duration::from_secs(config.connection_timeout.max(1));
        let attempts = config.max_retries.max(1);

        let mut last_error = None;
        for attempt in 1..=attempts {
            match tokio::time::timeout(connect_timeout, client.get_multiplexed_tokio_connection()).await {
                Ok(Ok(connection)) => {
                    info!(attempt = attempt, "Connected to Redis");
                    return Ok(Self::from_connection(connection, config));
                }
                Ok(Err(e)) => {
                    warn!(attempt = attempt, error = %e, "Redis connection failed");
                    last_error = Some(InfrastructureError::Cache(e));
                }
                Err(_) => {
                    warn!(attempt = attempt, "Redis connection timed out");
                    last_error = Some(InfrastructureError::Timeout("redis".to_string()));
                }
            }
            if attempt < attempts {
                tokio::time::sleep(Duration::from_millis(200 * u64::from(attempt))).await;
            }
        }

        Err(last_error.unwrap_or_else(|| InfrastructureError::Timeout("redis".to_string())))
    }

    pub fn from_connection(connection: MultiplexedConnection, config: &CacheConfig) -> Self {
        Self {
            connection,
            key_prefix: config.key_prefix.clone(),
            operation_timeout: Duration::from_millis(config.operation_timeout_ms.max(1)),
            increment_script: Script::new(INCREMENT_SCRIPT),
            release_script: Script::new(RELEASE_LOCK_SCRIPT),
        }
    }

    pub(crate) fn prefixed_key(&self, key: &str) -> String {
        prefixed(self.key_prefix.as_deref(), key)
    }

    pub async fn ping(&self) -> DomainResult<()> {
        let mut conn = self.connection.clone();
        self.bounded("ping", async move {
            redis::cmd("PING").query_async::<_, String>(&mut conn).await
        })
        .await
        .map(|_| ())
    }

    /// Run one Redis round-trip under the operation timeout
    async fn bounded<T, F>(&self, operation: &'static str, future: F) -> DomainResult<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.operation_timeout, future).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                error!(operation = operation, error = %e, "Redis command failed");
                Err(DomainError::unavailable(format!("redis {}: {}", operation, e)))
            }
            Err(_) => {
                warn!(
                    operation = operation,
                    timeout_ms = self.operation_timeout.as_millis() as u64,
                    "Redis command timed out"
                );
                Err(DomainError::unavailable(format!("redis {} timed out", operation)))
            }
        }
    }
}

pub(crate) fn prefixed(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, key),
        _ => key.to_string(),
    }
}

/// Milliseconds for PX / PEXPIRE; Redis rejects zero
pub(crate) fn expiry_millis(duration: Duration) -> u64 {
    (duration.as_millis() as u64).max(1)
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn increment_with_expiry(&self, key: &str, window: Duration) -> DomainResult<CounterState> {
        let key = self.prefixed_key(key);
        let mut conn = self.connection.clone();
        let script = self.increment_script.clone();
        let window_ms = expiry_millis(window);

        let (count, ttl_ms): (i64, i64) = self
            .bounded("increment", async move {
                script.key(&key).arg(window_ms).invoke_async(&mut conn).await
            })
            .await?;

        debug!(count = count, ttl_ms = ttl_ms, "Counter incremented");
        Ok(CounterState {
            count: count.max(0) as u64,
            ttl: Duration::from_millis(ttl_ms.max(0) as u64),
        })
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> DomainResult<()> {
        let key = self.prefixed_key(key);
        let mut conn = self.connection.clone();
        let ttl_ms = expiry_millis(ttl);

        self.bounded("set", async move {
            redis::cmd("SET")
                .arg(&key)
                .arg(value)
                .arg("PX")
                .arg(ttl_ms)
                .query_async::<_, ()>(&mut conn)
                .await
        })
        .await
    }

    async fn get(&self, key: &str) -> DomainResult<Option<String>> {
        let key = self.prefixed_key(key);
        let mut conn = self.connection.clone();
        self.bounded("get", async move { conn.get(&key).await }).await
    }

    async fn delete(&self, key: &str) -> DomainResult<bool> {
        let key = self.prefixed_key(key);
        let mut conn = self.connection.clone();
        let removed: i64 = self.bounded("delete", async move { conn.del(&key).await }).await?;
        Ok(removed > 0)
    }

    async fn try_acquire_lock(&self, key: &str, owner: &str, ttl: Duration) -> DomainResult<bool> {
        let key = self.prefixed_key(key);
        let mut conn = self.connection.clone();
        let ttl_ms = expiry_millis(ttl);

        let reply: Option<String> = self
            .bounded("lock", async move {
                redis::cmd("SET")
                    .arg(&key)
                    .arg(owner)
                    .arg("NX")
                    .arg("PX")
                    .arg(ttl_ms)
                    .query_async(&mut conn)
                    .await
            })
            .await?;
        Ok(reply.is_some())
    }

    async fn release_lock(&self, key: &str, owner: &str) -> DomainResult<bool> {
        let key = self.prefixed_key(key);
        let mut conn = self.connection.clone();
        let script = self.release_script.clone();

        let removed: i64 = self
            .bounded("unlock", async move {
                script.key(&key).arg(owner).invoke_async(&mut conn).await
            })
            .await?;
        Ok(removed > 0)
    }
}
