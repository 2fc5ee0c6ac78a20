//! Configuration loading
//!
//! Embedded defaults, then optional files, then environment.

use super::config::AppConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Deployment environment name (`WAGATE_ENV`, default `development`)
pub fn environment() -> String {
    std::env::var("WAGATE_ENV").unwrap_or_else(|_| "development".to_string())
}

/// Load configuration from files and environment
pub fn load_config() -> Result<AppConfig> {
    let config = Config::builder()
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        .add_source(File::with_name(&format!("config/{}", environment())).required(false))
        .add_source(File::with_name("config/local").required(false))
        // WAGATE_SERVER__PORT -> server.port
        .add_source(
            Environment::with_prefix("WAGATE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}
