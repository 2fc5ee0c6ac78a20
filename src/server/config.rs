//! Server configuration types

use serde::Deserialize;
use std::time::Duration;
use wagate_core::{CacheTtls, WebhookConfig};
use wagate_providers::{BaileysConfig, MetaApiConfig};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub webhooks: WebhookConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// HTTP listener
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// SQLite store
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    /// Use Redis for the session cache; an in-process cache is used otherwise
    #[serde(default)]
    pub enabled: bool,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            enabled: false,
        }
    }
}

/// Provider settings
#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub baileys: BaileysConfig,
    #[serde(default)]
    pub meta_api: MetaApiConfig,
    #[serde(default = "default_health_cache_secs")]
    pub health_cache_secs: u64,
}

fn default_health_cache_secs() -> u64 {
    300
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            baileys: BaileysConfig::default(),
            meta_api: MetaApiConfig::default(),
            health_cache_secs: default_health_cache_secs(),
        }
    }
}

impl ProvidersConfig {
    pub fn health_ttl(&self) -> Duration {
        Duration::from_secs(self.health_cache_secs)
    }
}

/// Session cache TTLs
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub status_ttl_secs: u64,
    pub qr_ttl_secs: u64,
    pub tenant_sessions_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            status_ttl_secs: 30,
            qr_ttl_secs: 60,
            tenant_sessions_ttl_secs: 60,
        }
    }
}

impl CacheConfig {
    pub fn ttls(&self) -> CacheTtls {
        CacheTtls {
            status: Duration::from_secs(self.status_ttl_secs),
            qr: Duration::from_secs(self.qr_ttl_secs),
            tenant_sessions: Duration::from_secs(self.tenant_sessions_ttl_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::loader::DEFAULT_CONFIG;
    use config::{Config, File, FileFormat};

    #[test]
    fn test_embedded_defaults_deserialize() {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 8080);
        assert!(!config.redis.enabled);
        assert_eq!(config.providers.baileys.qr_poll_attempts, 3);
        assert!(config.providers.meta_api.access_token.is_none());
        assert_eq!(config.providers.health_ttl(), Duration::from_secs(300));
        assert_eq!(config.webhooks.max_retries, 3);
        assert_eq!(config.cache.ttls().status, Duration::from_secs(30));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let toml = r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [database]
            url = "sqlite::memory:"
        "#;
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.providers.baileys.base_url, "http://localhost:3001");
        assert_eq!(config.webhooks.timeout_secs, 10);
        assert_eq!(config.cache.qr_ttl_secs, 60);
    }
}
