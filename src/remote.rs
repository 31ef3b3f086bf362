//! Remote cache tier
//!
//! The coordinator talks to the remote tier through the [`RemoteCache`]
//! capability trait: a network-accessible key-value store with per-entry
//! expiry and pattern deletes. [`RedisRemoteCache`] is the Redis-backed
//! implementation used in production; tests substitute their own.
//!
//! Payloads are pre-serialized JSON strings; the remote store never sees
//! the typed values.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::debug;

/// Capability interface of the remote key-value tier
#[async_trait]
pub trait RemoteCache: Send + Sync + 'static {
    /// Fetch the serialized payload for a key, or `None` on a miss
    async fn get(
        &self,
        key: &str,
    ) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>>;

    /// Store a serialized payload. `ttl` of `None` leaves retention to the
    /// tier's own default.
    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Delete a single key
    async fn delete(&self, key: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Delete every key matching the store's own glob dialect
    async fn delete_pattern(
        &self,
        pattern: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Redis-backed remote tier
pub struct RedisRemoteCache {
    conn: ConnectionManager,
    default_ttl: Option<Duration>,
}

impl RedisRemoteCache {
    /// Wrap an existing connection manager
    ///
    /// `default_ttl` is applied to writes that carry no per-call TTL;
    /// `None` stores those entries without expiry.
    pub fn new(conn: ConnectionManager, default_ttl: Option<Duration>) -> Self {
        Self { conn, default_ttl }
    }

    /// Connect to a Redis server by URL
    pub async fn connect(
        url: &str,
        default_ttl: Option<Duration>,
    ) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::new(conn, default_ttl))
    }
}

#[async_trait]
impl RemoteCache for RedisRemoteCache {
    async fn get(
        &self,
        key: &str,
    ) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>> {
        let mut conn = self.conn.clone();
        Ok(conn.get::<_, Option<String>>(key).await?)
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut conn = self.conn.clone();
        match ttl.or(self.default_ttl) {
            Some(ttl) => {
                conn.set_ex::<_, _, ()>(key, value, ttl.as_secs()).await?;
            }
            None => {
                conn.set::<_, _, ()>(key, value).await?;
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    async fn delete_pattern(
        &self,
        pattern: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // SCAN, never KEYS: the iteration must not block the server
        let mut scan_conn = self.conn.clone();
        let mut keys: Vec<String> = Vec::new();
        {
            let mut iter = scan_conn.scan_match::<_, String>(pattern).await?;
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
        }

        debug!("Pattern {} matched {} remote keys", pattern, keys.len());

        if keys.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.clone();
        conn.del::<_, ()>(keys).await?;
        Ok(())
    }
}
