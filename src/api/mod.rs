//! REST API
//!
//! Every route lives under `/api/v1`, except `/health`. Tenant-scoped routes
//! resolve the caller through the `X-Client-Id` header.

pub mod agents;
pub mod extract;
pub mod health;
pub mod messages;
pub mod providers;
pub mod response;
pub mod sessions;
pub mod tenants;
pub mod webhooks;

#[cfg(test)]
mod tests;

use axum::{Extension, Router};
use std::sync::Arc;
use wagate_core::{Database, MessageService, ProviderFactory, SessionService, WebhookDeliveryService};
use wagate_providers::MetaApiProvider;

pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use response::{ok, ApiError, ApiResponse, ApiResult};

/// Shared handler state, installed as a request extension
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub factory: Arc<ProviderFactory>,
    pub sessions: SessionService,
    pub messages: MessageService,
    pub webhooks: Arc<WebhookDeliveryService>,
    pub meta: Arc<MetaApiProvider>,
}

/// Create the router with all endpoints
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .merge(health::health_routes())
        .merge(tenants::tenants_routes())
        .merge(sessions::sessions_routes())
        .merge(messages::messages_routes())
        .merge(providers::providers_routes())
        .merge(agents::agents_routes())
        .merge(webhooks::webhooks_routes())
        .layer(Extension(state))
}
