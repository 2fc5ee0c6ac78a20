//! Health check endpoint
//!
//! `GET /health` reports overall status plus the store and provider flags.
//! It needs no tenant header so load balancers can call it.

use axum::{extract::Extension, response::Json, routing::get, Router};
use serde::Serialize;
use wagate_providers::ProviderType;

use super::AppState;

/// Health response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: bool,
    pub providers: Vec<ProviderHealth>,
}

/// Cached health flag of one provider
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderHealth {
    pub provider_type: ProviderType,
    pub registered: bool,
    pub healthy: bool,
}

async fn health_check(Extension(state): Extension<AppState>) -> Json<HealthResponse> {
    let database = state.db.ping().await;
    let registered = state.factory.registered();

    let providers = ProviderType::ALL
        .into_iter()
        .map(|provider_type| ProviderHealth {
            provider_type,
            registered: registered.contains(&provider_type),
            healthy: state.factory.cached_health(provider_type),
        })
        .collect();

    Json(HealthResponse {
        status: if database { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database,
        providers,
    })
}

/// Create health routes
pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_check))
}
