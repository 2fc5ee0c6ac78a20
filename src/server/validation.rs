//! Production configuration validation

use super::config::AppConfig;
use super::loader::environment;
use tracing::warn;

/// Log warnings for settings that are risky in production
pub fn validate_production_config(config: &AppConfig) {
    if environment().to_lowercase() != "production" {
        return;
    }

    for warning in production_warnings(config) {
        warn!("SECURITY WARNING: {}", warning);
    }
}

fn production_warnings(config: &AppConfig) -> Vec<&'static str> {
    let mut warnings = Vec::new();

    if config.server.host == "0.0.0.0" {
        warnings.push(
            "Server is binding to all interfaces (0.0.0.0). \
             Consider binding to 127.0.0.1 behind a reverse proxy.",
        );
    }

    if config.redis.enabled
        && config.redis.url.starts_with("redis://")
        && !config.redis.url.contains('@')
    {
        warnings.push("Redis connection appears to have no authentication. Consider enabling Redis AUTH.");
    }

    let meta = &config.providers.meta_api;
    if meta.access_token.is_some() && meta.verify_token == "wagate_webhook_verify" {
        warnings.push("Meta webhook verify token is still the default value.");
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::loader::DEFAULT_CONFIG;
    use config::{Config, File, FileFormat};

    fn default_config() -> AppConfig {
        Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_are_quiet() {
        assert!(production_warnings(&default_config()).is_empty());
    }

    #[test]
    fn test_exposed_bind_and_open_redis() {
        let mut config = default_config();
        config.server.host = "0.0.0.0".to_string();
        config.redis.enabled = true;

        assert_eq!(production_warnings(&config).len(), 2);

        config.redis.url = "redis://:pw@cache:6379".to_string();
        assert_eq!(production_warnings(&config).len(), 1);
    }
}
