//! Redis cache module
//!
//! Connects to Redis and implements the token denylist used to revoke
//! session tokens on logout.

use anyhow::Result;
use async_trait::async_trait;
use redis::{AsyncCommands, Client};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::info;

/// Configuration for Redis connection
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub url: String,
}

impl RedisConfig {
    /// Create a new RedisConfig from environment variables
    ///
    /// # Environment Variables
    /// - `REDIS_URL`: Redis connection URL (default: "redis://localhost:6379")
    pub fn from_env() -> Result<Self> {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        Ok(RedisConfig { url })
    }
}

/// Redis connection handle
#[derive(Clone)]
pub struct RedisPool {
    client: Client,
}

impl RedisPool {
    /// Initialize a new Redis client
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.clone())?;
        info!("Redis client initialized with URL: {}", config.url);
        Ok(RedisPool { client })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        let conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn)
    }

    /// Set a key-value pair in Redis with optional TTL
    pub async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> Result<()> {
        let mut conn = self.get_connection().await?;

        if let Some(ttl) = ttl_seconds {
            let _: () = conn.set_ex(key, value, ttl).await?;
        } else {
            let _: () = conn.set(key, value).await?;
        }

        Ok(())
    }

    /// Get a value from Redis by key
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    /// Check if Redis is reachable
    pub async fn health_check(&self) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}

/// Revoked session tokens, kept until they would have expired anyway
#[async_trait]
pub trait TokenDenylist: Send + Sync {
    /// Revoke a token for `ttl_seconds`
    async fn revoke(&self, token: &str, ttl_seconds: u64) -> Result<()>;

    /// Whether a token has been revoked
    async fn is_revoked(&self, token: &str) -> Result<bool>;
}

fn denylist_key(token: &str) -> String {
    format!("revoked_token:{}", token)
}

#[async_trait]
impl TokenDenylist for RedisPool {
    async fn revoke(&self, token: &str, ttl_seconds: u64) -> Result<()> {
        // SETEX rejects a zero TTL; an already-expired token needs no entry.
        if ttl_seconds == 0 {
            return Ok(());
        }
        self.set(&denylist_key(token), "1", Some(ttl_seconds)).await
    }

    async fn is_revoked(&self, token: &str) -> Result<bool> {
        Ok(self.get(&denylist_key(token)).await?.is_some())
    }
}

/// Process-local denylist for tests and single-node development
#[derive(Debug, Clone, Default)]
pub struct MemoryDenylist {
    entries: Arc<Mutex<HashMap<String, Instant>>>,
}

impl MemoryDenylist {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenDenylist for MemoryDenylist {
    async fn revoke(&self, token: &str, ttl_seconds: u64) -> Result<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }
        let mut entries = self.entries.lock().await;
        entries.insert(
            denylist_key(token),
            Instant::now() + Duration::from_secs(ttl_seconds),
        );
        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        entries.retain(|_, expires| *expires > now);
        Ok(entries.contains_key(&denylist_key(token)))
    }
}
