//! Session endpoints
//!
//! POST   /api/v1/sessions                   - Initialize (or re-initialize) a session
//! GET    /api/v1/sessions                   - List the tenant's sessions
//! GET    /api/v1/sessions/:phone/status     - Current status
//! GET    /api/v1/sessions/:phone/qr         - QR code to pair the phone
//! POST   /api/v1/sessions/:phone/disconnect - Log out
//! DELETE /api/v1/sessions/:phone            - Remove the session

use axum::{
    extract::Extension,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use wagate_providers::{ProviderType, SessionStatus};

use super::{ok, ApiError, ApiJson, ApiPath, ApiResult, AppState};
use crate::middleware::CurrentTenant;

/// Request to initialize a session
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeSessionRequest {
    pub phone_number: String,
    /// Overrides the tenant's preferred provider
    #[serde(default)]
    pub provider_type: Option<ProviderType>,
}

/// QR code payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeResponse {
    pub phone_number: String,
    pub qr_code: String,
}

async fn initialize_session(
    CurrentTenant(tenant): CurrentTenant,
    Extension(state): Extension<AppState>,
    ApiJson(request): ApiJson<InitializeSessionRequest>,
) -> ApiResult<SessionStatus> {
    let preferred = request
        .provider_type
        .or(tenant.settings.preferred_provider);

    let status = state
        .sessions
        .initialize_session(tenant.id, &request.phone_number, preferred)
        .await?;

    let payload = serde_json::to_value(&status).unwrap_or_default();
    state.webhooks.notify(&tenant, "session.initialized", payload);
    ok(status)
}

async fn list_sessions(
    CurrentTenant(tenant): CurrentTenant,
    Extension(state): Extension<AppState>,
) -> ApiResult<Vec<SessionStatus>> {
    ok(state.sessions.list_sessions(tenant.id).await?)
}

async fn session_status(
    CurrentTenant(tenant): CurrentTenant,
    Extension(state): Extension<AppState>,
    ApiPath(phone): ApiPath<String>,
) -> ApiResult<SessionStatus> {
    ok(state.sessions.get_session_status(tenant.id, &phone).await)
}

async fn session_qr(
    CurrentTenant(tenant): CurrentTenant,
    Extension(state): Extension<AppState>,
    ApiPath(phone): ApiPath<String>,
) -> ApiResult<QrCodeResponse> {
    let qr_code = state
        .sessions
        .get_qr_code(tenant.id, &phone)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("No QR code available for {phone}")))?;

    ok(QrCodeResponse {
        phone_number: wagate_providers::phone::normalize(&phone),
        qr_code,
    })
}

async fn disconnect_session(
    CurrentTenant(tenant): CurrentTenant,
    Extension(state): Extension<AppState>,
    ApiPath(phone): ApiPath<String>,
) -> ApiResult<SessionStatus> {
    let status = state.sessions.disconnect_session(tenant.id, &phone).await?;

    let payload = serde_json::to_value(&status).unwrap_or_default();
    state.webhooks.notify(&tenant, "session.disconnected", payload);
    ok(status)
}

async fn delete_session(
    CurrentTenant(tenant): CurrentTenant,
    Extension(state): Extension<AppState>,
    ApiPath(phone): ApiPath<String>,
) -> ApiResult<serde_json::Value> {
    state.sessions.delete_session(tenant.id, &phone).await?;
    ok(json!({ "deleted": true }))
}

/// Create session routes
pub fn sessions_routes() -> Router {
    Router::new()
        .route(
            "/api/v1/sessions",
            post(initialize_session).get(list_sessions),
        )
        .route("/api/v1/sessions/:phone/status", get(session_status))
        .route("/api/v1/sessions/:phone/qr", get(session_qr))
        .route("/api/v1/sessions/:phone/disconnect", post(disconnect_session))
        .route("/api/v1/sessions/:phone", delete(delete_session))
}
