//! Tenant endpoints
//!
//! POST /api/v1/tenants                  - Create a tenant (no client id needed)
//! GET  /api/v1/tenants/current          - The calling tenant
//! PUT  /api/v1/tenants/current/settings - Replace the calling tenant's settings

use axum::{
    extract::Extension,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use wagate_core::{Tenant, TenantSettings};
use wagate_providers::ProviderType;

use super::{ok, ApiError, ApiJson, ApiResponse, ApiResult, AppState};
use crate::middleware::CurrentTenant;

/// Request to create a tenant
#[derive(Debug, Deserialize)]
pub struct CreateTenantRequest {
    pub name: String,
    #[serde(default)]
    pub settings: Option<TenantSettings>,
}

/// Tenant as returned by the API; the webhook secret is never echoed back
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantView {
    pub id: Uuid,
    pub client_id: String,
    pub name: String,
    pub settings: SettingsView,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Settings with the secret replaced by a flag
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub webhook_url: Option<String>,
    pub has_webhook_secret: bool,
    pub webhook_events: Vec<String>,
    pub preferred_provider: Option<ProviderType>,
    pub ai_enabled: bool,
}

impl From<Tenant> for TenantView {
    fn from(tenant: Tenant) -> Self {
        let settings = tenant.settings;
        Self {
            id: tenant.id,
            client_id: tenant.client_id,
            name: tenant.name,
            settings: SettingsView {
                webhook_url: settings.webhook_url,
                has_webhook_secret: settings.webhook_secret.is_some_and(|s| !s.is_empty()),
                webhook_events: settings.webhook_events,
                preferred_provider: settings.preferred_provider,
                ai_enabled: settings.ai_enabled,
            },
            created_at: tenant.created_at,
            updated_at: tenant.updated_at,
        }
    }
}

fn validate_settings(settings: &TenantSettings) -> Result<(), ApiError> {
    if let Some(url) = settings.webhook_url.as_deref().filter(|u| !u.is_empty()) {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ApiError::BadRequest(
                "webhookUrl must be an http(s) URL".to_string(),
            ));
        }
    }
    Ok(())
}

async fn create_tenant(
    Extension(state): Extension<AppState>,
    ApiJson(request): ApiJson<CreateTenantRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TenantView>>), ApiError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("name is required".to_string()));
    }

    let mut tenant = Tenant::new(name);
    if let Some(settings) = request.settings {
        validate_settings(&settings)?;
        tenant.settings = settings;
    }
    state.db.create_tenant(&tenant).await?;

    info!(tenant_id = %tenant.id, name = %tenant.name, "Tenant created");
    Ok((StatusCode::CREATED, Json(ApiResponse::success(tenant.into()))))
}

async fn current_tenant(CurrentTenant(tenant): CurrentTenant) -> ApiResult<TenantView> {
    ok(tenant.into())
}

async fn update_settings(
    CurrentTenant(tenant): CurrentTenant,
    Extension(state): Extension<AppState>,
    ApiJson(settings): ApiJson<TenantSettings>,
) -> ApiResult<TenantView> {
    validate_settings(&settings)?;
    state.db.update_tenant_settings(tenant.id, &settings).await?;

    info!(tenant_id = %tenant.id, "Tenant settings updated");
    ok(state.db.get_tenant(tenant.id).await?.into())
}

/// Create tenant routes
pub fn tenants_routes() -> Router {
    Router::new()
        .route("/api/v1/tenants", post(create_tenant))
        .route("/api/v1/tenants/current", get(current_tenant))
        .route("/api/v1/tenants/current/settings", put(update_settings))
}
