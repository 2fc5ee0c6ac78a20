//! Server initialization and main run loop

use super::config::AppConfig;
use super::loader::load_config;
use super::validation::validate_production_config;
use crate::api::{api_router, AppState};
use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use wagate_core::{
    CannedResponder, Database, MemorySessionCache, MessageService, NoopSessionCache, ProviderFactory,
    RedisSessionCache, SessionCache, SessionService, StatusCache, WebhookDeliveryService,
};
use wagate_providers::{BaileysProvider, MetaApiProvider};

/// Make sure the directory of a file-backed SQLite URL exists
fn ensure_sqlite_dir(url: &str) -> Result<()> {
    let Some(path) = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
    else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }

    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Open the store and run migrations
pub async fn open_database(config: &AppConfig) -> Result<Database> {
    ensure_sqlite_dir(&config.database.url)?;
    Database::connect(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to open database")
}

async fn init_cache(config: &AppConfig) -> StatusCache {
    let backend: Arc<dyn SessionCache> = if config.redis.enabled {
        match RedisSessionCache::connect(&config.redis.url).await {
            Ok(redis) => Arc::new(redis),
            Err(e) => {
                warn!(error = %e, "Redis unavailable, session caching disabled");
                Arc::new(NoopSessionCache)
            }
        }
    } else {
        info!("Using in-process session cache");
        Arc::new(MemorySessionCache::new())
    };

    StatusCache::new(backend, config.cache.ttls())
}

/// Wire the services together
pub async fn build_state(config: &AppConfig, db: Database) -> Result<AppState> {
    let baileys = BaileysProvider::new(config.providers.baileys.clone())
        .context("Failed to create Baileys provider")?;
    let meta = Arc::new(
        MetaApiProvider::new(config.providers.meta_api.clone())
            .context("Failed to create Meta API provider")?,
    );

    let factory = Arc::new(
        ProviderFactory::new(config.providers.health_ttl())
            .with_provider(Arc::new(baileys))
            .with_provider(meta.clone()),
    );

    let cache = init_cache(config).await;
    let webhooks = Arc::new(
        WebhookDeliveryService::new(&config.webhooks)
            .context("Failed to create webhook delivery service")?,
    );

    let sessions = SessionService::new(db.clone(), factory.clone(), cache);
    let messages = MessageService::new(
        db.clone(),
        factory.clone(),
        webhooks.clone(),
        Arc::new(CannedResponder),
    );

    Ok(AppState {
        db,
        factory,
        sessions,
        messages,
        webhooks,
        meta,
    })
}

/// Router with HTTP tracing and permissive CORS
pub fn build_router(state: AppState) -> Router {
    api_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Run the server
pub async fn run() -> Result<()> {
    info!("Starting wagate v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config().context("Failed to load configuration")?;
    info!("Configuration loaded");

    validate_production_config(&config);

    let db = open_database(&config).await?;
    let state = build_state(&config, db).await?;
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("wagate shutdown complete");
    Ok(())
}

/// Run store migrations and exit
pub async fn migrate() -> Result<()> {
    let config = load_config().context("Failed to load configuration")?;
    open_database(&config).await?;
    info!(url = %config.database.url, "Migrations applied");
    Ok(())
}
