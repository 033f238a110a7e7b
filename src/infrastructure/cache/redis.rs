//! Redis key-value store

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, ErrorKind, RedisResult};
use tracing::debug;

use crate::domain::cache::Cache;
use crate::domain::DomainError;

/// Configuration for the Redis store
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
    /// Bound on establishing the initial connection
    pub connection_timeout: Duration,
    /// Bound on every individual command
    pub operation_timeout: Duration,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: None,
            connection_timeout: Duration::from_secs(5),
            operation_timeout: Duration::from_secs(2),
        }
    }
}

impl RedisCacheConfig {
    /// Creates a new configuration with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Sets the connection timeout
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Sets the per-command timeout
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }
}

/// Redis-backed store
///
/// Expiry is set with millisecond precision (`SET .. PX`) so an entry never
/// outlives the deadline it was written for. The connection manager
/// reconnects on its own; every command is bounded by the operation timeout
/// and a timeout surfaces as [`DomainError::StoreUnavailable`].
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
    config: RedisCacheConfig,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisCache {
    /// Connects to Redis
    pub async fn new(config: RedisCacheConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str()).map_err(|e| {
            DomainError::configuration(format!("Failed to create Redis client: {}", e))
        })?;

        let connect = ConnectionManager::new(client);
        let connection = tokio::time::timeout(config.connection_timeout, connect)
            .await
            .map_err(|_| {
                DomainError::store_unavailable(format!(
                    "Timed out connecting to Redis after {:?}",
                    config.connection_timeout
                ))
            })?
            .map_err(|e| {
                DomainError::store_unavailable(format!("Failed to connect to Redis: {}", e))
            })?;

        debug!(url = %config.url, "Connected to Redis");

        Ok(Self { connection, config })
    }

    fn prefix_key(&self, key: &str) -> String {
        match &self.config.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }

    async fn timed<T, F>(
        &self,
        op: &str,
        key: &str,
        command: F,
    ) -> Result<RedisResult<T>, DomainError>
    where
        F: Future<Output = RedisResult<T>>,
    {
        bounded(self.config.operation_timeout, op, key, command).await
    }

    async fn run<T, F>(&self, op: &str, key: &str, command: F) -> Result<T, DomainError>
    where
        F: Future<Output = RedisResult<T>>,
    {
        self.timed(op, key, command).await?.map_err(|e| command_failed(op, key, e))
    }
}

/// Bounds a command by `timeout`; an elapsed timeout is a store outage
async fn bounded<T, F>(
    timeout: Duration,
    op: &str,
    key: &str,
    command: F,
) -> Result<RedisResult<T>, DomainError>
where
    F: Future<Output = RedisResult<T>>,
{
    tokio::time::timeout(timeout, command).await.map_err(|_| {
        DomainError::store_unavailable(format!(
            "Redis {} for key '{}' timed out after {:?}",
            op, key, timeout
        ))
    })
}

fn command_failed(op: &str, key: &str, error: redis::RedisError) -> DomainError {
    DomainError::store_unavailable(format!("Redis {} for key '{}' failed: {}", op, key, error))
}

#[async_trait]
impl Cache for RedisCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let result: Option<String> = self.run("GET", key, conn.get(&prefixed_key)).await?;

        Ok(result)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let ttl_millis = ttl.as_millis().max(1) as u64;

        let mut command = redis::cmd("SET");
        command.arg(&prefixed_key).arg(value).arg("PX").arg(ttl_millis);

        self.run("SET", key, command.query_async::<()>(&mut conn))
            .await
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let deleted: i64 = self.run("DEL", key, conn.del(&prefixed_key)).await?;

        Ok(deleted > 0)
    }

    async fn rename(&self, from: &str, to: &str) -> Result<bool, DomainError> {
        let prefixed_from = self.prefix_key(from);
        let prefixed_to = self.prefix_key(to);
        let mut conn = self.connection.clone();

        // RENAME keeps the source's remaining TTL and overwrites the target
        let mut command = redis::cmd("RENAME");
        command.arg(&prefixed_from).arg(&prefixed_to);

        match self
            .timed("RENAME", from, command.query_async::<()>(&mut conn))
            .await?
        {
            Ok(()) => Ok(true),
            Err(e) if is_missing_key(&e) => Ok(false),
            Err(e) => Err(DomainError::store_unavailable(format!(
                "Redis RENAME '{}' -> '{}' failed: {}",
                from, to, e
            ))),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        self.run("EXISTS", key, conn.exists(&prefixed_key)).await
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let mut command = redis::cmd("PTTL");
        command.arg(&prefixed_key);

        let ttl: i64 = self
            .run("PTTL", key, command.query_async(&mut conn))
            .await?;

        // -2 = key doesn't exist, -1 = no expiry
        if ttl < 0 {
            Ok(None)
        } else {
            Ok(Some(Duration::from_millis(ttl as u64)))
        }
    }

    async fn ping(&self) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        let command = redis::cmd("PING");
        let _pong: String = self.run("PING", "", command.query_async(&mut conn)).await?;

        Ok(())
    }
}

fn is_missing_key(error: &redis::RedisError) -> bool {
    error.kind() == ErrorKind::ResponseError && error.to_string().to_lowercase().contains("no such key")
}
