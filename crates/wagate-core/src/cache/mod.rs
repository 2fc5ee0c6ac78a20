//! Short-lived session cache
//!
//! Backends only store strings with a TTL; [`StatusCache`] layers the key
//! scheme and JSON encoding on top. Cache failures never surface to callers:
//! a broken backend behaves like an empty one.

mod memory;
mod redis_cache;

pub use self::memory::MemorySessionCache;
pub use self::redis_cache::RedisSessionCache;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;
use wagate_providers::SessionStatus;

/// Key-value backend with expiry
#[async_trait]
pub trait SessionCache: Send + Sync {
    /// Get a value, `None` on miss or backend failure
    async fn get(&self, key: &str) -> Option<String>;

    /// Set a value with a TTL
    async fn set(&self, key: &str, value: String, ttl: Duration);

    /// Remove keys
    async fn delete(&self, keys: &[String]);
}

/// Cache that never holds anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSessionCache;

#[async_trait]
impl SessionCache for NoopSessionCache {
    async fn get(&self, _key: &str) -> Option<String> {
        None
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) {}

    async fn delete(&self, _keys: &[String]) {}
}

/// TTLs per cached item
#[derive(Debug, Clone, Copy)]
pub struct CacheTtls {
    /// Session status
    pub status: Duration,
    /// QR code
    pub qr: Duration,
    /// Tenant session list
    pub tenant_sessions: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            status: Duration::from_secs(30),
            qr: Duration::from_secs(60),
            tenant_sessions: Duration::from_secs(60),
        }
    }
}

fn status_key(tenant_id: Uuid, phone: &str) -> String {
    format!("wagate:session:status:{}:{}", tenant_id, phone)
}

fn qr_key(tenant_id: Uuid, phone: &str) -> String {
    format!("wagate:session:qr:{}:{}", tenant_id, phone)
}

fn tenant_sessions_key(tenant_id: Uuid) -> String {
    format!("wagate:tenant:sessions:{}", tenant_id)
}

/// Typed view of the session cache
#[derive(Clone)]
pub struct StatusCache {
    backend: Arc<dyn SessionCache>,
    ttls: CacheTtls,
}

impl StatusCache {
    /// Wrap a backend
    pub fn new(backend: Arc<dyn SessionCache>, ttls: CacheTtls) -> Self {
        Self { backend, ttls }
    }

    /// Cache that always misses
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Arc::new(NoopSessionCache), CacheTtls::default())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.backend.get(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key, error = %e, "Dropping undecodable cache entry");
                self.backend.delete(&[key.to_string()]).await;
                None
            }
        }
    }

    async fn set_json<T: serde::Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_string(value) {
            Ok(json) => self.backend.set(key, json, ttl).await,
            Err(e) => warn!(key, error = %e, "Failed to encode cache entry"),
        }
    }

    /// Cached status of a session
    pub async fn get_status(&self, tenant_id: Uuid, phone: &str) -> Option<SessionStatus> {
        self.get_json(&status_key(tenant_id, phone)).await
    }

    /// Cache a session status
    pub async fn set_status(&self, tenant_id: Uuid, phone: &str, status: &SessionStatus) {
        self.set_json(&status_key(tenant_id, phone), status, self.ttls.status)
            .await;
    }

    /// Cached QR code of a session
    pub async fn get_qr(&self, tenant_id: Uuid, phone: &str) -> Option<String> {
        self.backend.get(&qr_key(tenant_id, phone)).await
    }

    /// Cache a QR code
    pub async fn set_qr(&self, tenant_id: Uuid, phone: &str, qr_code: &str) {
        self.backend
            .set(&qr_key(tenant_id, phone), qr_code.to_string(), self.ttls.qr)
            .await;
    }

    /// Cached session list of a tenant
    pub async fn get_tenant_sessions(&self, tenant_id: Uuid) -> Option<Vec<SessionStatus>> {
        self.get_json(&tenant_sessions_key(tenant_id)).await
    }

    /// Cache a tenant's session list
    pub async fn set_tenant_sessions(&self, tenant_id: Uuid, sessions: &[SessionStatus]) {
        self.set_json(
            &tenant_sessions_key(tenant_id),
            sessions,
            self.ttls.tenant_sessions,
        )
        .await;
    }

    /// Drop everything cached for a session, including the tenant list
    pub async fn invalidate(&self, tenant_id: Uuid, phone: &str) {
        self.backend
            .delete(&[
                status_key(tenant_id, phone),
                qr_key(tenant_id, phone),
                tenant_sessions_key(tenant_id),
            ])
            .await;
    }
}
