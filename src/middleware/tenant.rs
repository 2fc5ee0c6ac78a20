//! Tenant resolution for Axum
//!
//! Handlers that take a [`CurrentTenant`] only run when the request carries
//! an `X-Client-Id` header naming a known tenant.

use axum::{extract::FromRequestParts, http::request::Parts};
use wagate_core::Tenant;

use crate::api::{ApiError, AppState};

/// Header carrying the tenant's public client id
pub const CLIENT_ID_HEADER: &str = "x-client-id";

/// Axum extractor that resolves the calling tenant
pub struct CurrentTenant(pub Tenant);

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for CurrentTenant
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let client_id = parts
            .headers
            .get(CLIENT_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::BadRequest("X-Client-Id header is required".to_string()))?
            .to_string();

        let state = parts
            .extensions
            .get::<AppState>()
            .ok_or_else(|| ApiError::Internal("Application state not configured".to_string()))?;

        let tenant = state
            .db
            .find_tenant_by_client_id(&client_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Unknown client id".to_string()))?;

        Ok(CurrentTenant(tenant))
    }
}
