use anyhow::Result;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use std::time::Duration;

#[async_trait]
pub trait StatusCache: Send + Sync {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// `None` means the key is absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;
}

/// Redis-backed cache. The multiplexed connection is cheap to clone and
/// shared by all callers.
#[derive(Clone)]
pub struct RedisStatusCache {
    conn: MultiplexedConnection,
}

impl RedisStatusCache {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl StatusCache for RedisStatusCache {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value = redis::cmd("GET")
            .arg(key)
            .query_async::<_, Option<String>>(&mut conn)
            .await?;
        Ok(value)
    }
}
