//! Provider endpoints
//!
//! GET /api/v1/providers              - Usage and health per provider
//! GET /api/v1/providers/:type/health - Health of one provider (probes when stale)

use axum::{
    extract::Extension,
    routing::get,
    Router,
};
use serde::Serialize;
use wagate_core::ProviderStats;
use wagate_providers::ProviderType;

use super::{ok, ApiError, ApiPath, ApiResult, AppState};
use crate::middleware::CurrentTenant;

/// Health of one provider
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderHealthResponse {
    pub provider_type: ProviderType,
    pub is_healthy: bool,
}

async fn list_providers(
    CurrentTenant(_tenant): CurrentTenant,
    Extension(state): Extension<AppState>,
) -> ApiResult<Vec<ProviderStats>> {
    ok(state.factory.get_provider_stats(&state.db).await?)
}

async fn provider_health(
    CurrentTenant(_tenant): CurrentTenant,
    Extension(state): Extension<AppState>,
    ApiPath(provider): ApiPath<String>,
) -> ApiResult<ProviderHealthResponse> {
    let provider_type: ProviderType = provider
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Unknown provider type: {provider}")))?;

    ok(ProviderHealthResponse {
        provider_type,
        is_healthy: state.factory.is_provider_healthy(provider_type).await,
    })
}

/// Create provider routes
pub fn providers_routes() -> Router {
    Router::new()
        .route("/api/v1/providers", get(list_providers))
        .route("/api/v1/providers/:provider/health", get(provider_health))
}
