use super::SessionCache;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// In-process cache (for development/testing)
///
/// Entries expire lazily on read. Data is lost on restart and not shared
/// between replicas; use [`super::RedisSessionCache`] in production.
#[derive(Default)]
pub struct MemorySessionCache {
    entries: RwLock<HashMap<String, (String, Instant)>>,
}

impl MemorySessionCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether nothing is stored
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl SessionCache for MemorySessionCache {
    async fn get(&self, key: &str) -> Option<String> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some((value, expires_at)) if *expires_at > Instant::now() => {
                    return Some(value.clone())
                }
                Some(_) => {}
                None => return None,
            }
        }

        self.entries.write().await.remove(key);
        None
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) {
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value, Instant::now() + ttl));
    }

    async fn delete(&self, keys: &[String]) {
        let mut entries = self.entries.write().await;
        for key in keys {
            entries.remove(key);
        }
    }
}
