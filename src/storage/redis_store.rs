/// Redis storage backend
///
/// Expiring cache tier. Values are written with a native TTL derived from
/// the entry's absolute expiry, so redis drops them on its own.
use crate::error::IdResult;
use crate::storage::{now_ms, StorageBackend};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::info;

/// Redis-backed expiring store
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    /// Connect to redis at `url`
    pub async fn connect(url: &str) -> IdResult<Self> {
        info!("Connecting to Redis at {}", url);

        let client = Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;

        info!("✓ Redis connection established");

        Ok(Self { connection })
    }
}

#[async_trait]
impl StorageBackend for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    fn supports(&self) -> bool {
        true
    }

    fn tracks_expiry(&self) -> bool {
        true
    }

    async fn get(&self, key: &str) -> IdResult<Option<String>> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, expires_at_ms: i64) -> IdResult<()> {
        let ttl_ms = expires_at_ms - now_ms();
        if ttl_ms <= 0 {
            // Already past its expiry; writing would resurrect it
            return self.delete(key).await;
        }

        // Round up so sub-second lifetimes survive at least one second
        let ttl_secs = ((ttl_ms + 999) / 1000) as u64;

        let mut conn = self.connection.clone();
        let _: () = conn.set_ex(key, value, ttl_secs).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> IdResult<()> {
        let mut conn = self.connection.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }
}
