//! SQLite persistence
//!
//! One pool shared by every service. Every tenant-scoped query filters on
//! `tenant_id`; a row written under one tenant is never visible to another.

mod agents;
mod messages;
mod migrations;
mod rows;
mod sessions;
mod tenants;


use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::error::{Error, Result};

/// Store handle (cheap to clone)
#[derive(Clone)]
pub struct Database {
    pub(super) pool: Pool<Sqlite>,
}

impl Database {
    /// Open (creating if needed) a database file and run migrations
    pub async fn from_path(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Internal(format!("Failed to create directory: {}", e)))?;
        }

        let url = format!("sqlite:{}", path.display());
        Self::connect(&url, 5).await
    }

    /// Connect to a database URL and run migrations
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        info!(url = %url, "Database ready");
        Ok(db)
    }

    /// Liveness check used by `/health`
    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

fn parse_uuid(value: &str, what: &str) -> Result<uuid::Uuid> {
    uuid::Uuid::parse_str(value).map_err(|e| Error::Internal(format!("Invalid {} ID: {}", what, e)))
}
