use super::SessionCache;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Redis-backed cache (for production)
///
/// Every command opens a multiplexed connection; failures are logged and
/// treated as a miss.
pub struct RedisSessionCache {
    client: redis::Client,
}

impl RedisSessionCache {
    /// Create a new Redis cache
    ///
    /// # Errors
    ///
    /// Returns error if the Redis URL is invalid
    pub fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| Error::Internal(format!("Invalid Redis URL: {}", e)))?;

        Ok(Self { client })
    }

    /// Open the client and PING once so startup can fall back early
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let cache = Self::new(redis_url)?;
        let mut conn = cache.get_connection().await?;

        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| Error::Internal(format!("Redis PING failed: {}", e)))?;

        info!("Redis session cache connected");
        Ok(cache)
    }

    /// Get an async connection
    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| Error::Internal(format!("Redis connection failed: {}", e)))
    }
}

#[async_trait]
impl SessionCache for RedisSessionCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = match self.get_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(key, error = %e, "Cache read skipped");
                return None;
            }
        };

        match redis::cmd("GET")
            .arg(key)
            .query_async::<Option<String>>(&mut conn)
            .await
        {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Redis GET failed");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) {
        let mut conn = match self.get_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(key, error = %e, "Cache write skipped");
                return;
            }
        };

        let ttl_secs = ttl.as_secs().max(1);
        match redis::cmd("SETEX")
            .arg(key)
            .arg(ttl_secs)
            .arg(&value)
            .query_async::<()>(&mut conn)
            .await
        {
            Ok(()) => debug!(key, ttl = ttl_secs, "Cached in Redis"),
            Err(e) => warn!(key, error = %e, "Redis SETEX failed"),
        }
    }

    async fn delete(&self, keys: &[String]) {
        if keys.is_empty() {
            return;
        }

        let mut conn = match self.get_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "Cache invalidation skipped");
                return;
            }
        };

        if let Err(e) = redis::cmd("DEL")
            .arg(keys)
            .query_async::<i64>(&mut conn)
            .await
        {
            warn!(error = %e, "Redis DEL failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_rejected() {
        assert!(RedisSessionCache::new("not a url").is_err());
    }

    #[tokio::test]
    async fn test_unreachable_redis_degrades_to_miss() {
        let cache = RedisSessionCache::new("redis://127.0.0.1:1").unwrap();
        cache
            .set("wagate:test", "value".to_string(), Duration::from_secs(5))
            .await;
        assert!(cache.get("wagate:test").await.is_none());
        cache.delete(&["wagate:test".to_string()]).await;
    }

    #[tokio::test]
    #[cfg_attr(not(feature = "redis-tests"), ignore)]
    async fn test_redis_roundtrip() {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
        let cache = RedisSessionCache::connect(&url).await.unwrap();

        cache
            .set("wagate:test:roundtrip", "value".to_string(), Duration::from_secs(5))
            .await;
        assert_eq!(cache.get("wagate:test:roundtrip").await.as_deref(), Some("value"));

        cache.delete(&["wagate:test:roundtrip".to_string()]).await;
        assert!(cache.get("wagate:test:roundtrip").await.is_none());
    }
}
