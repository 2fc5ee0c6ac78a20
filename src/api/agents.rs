//! AI agent endpoints
//!
//! GET    /api/v1/agents     - List the tenant's agents
//! POST   /api/v1/agents     - Create an agent
//! PUT    /api/v1/agents/:id - Update an agent
//! DELETE /api/v1/agents/:id - Delete an agent and its conversations

use axum::{
    extract::Extension,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;
use wagate_core::AiAgent;

use super::{ok, ApiError, ApiJson, ApiPath, ApiResponse, ApiResult, AppState};
use crate::middleware::CurrentTenant;

/// Request to create an agent
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgentRequest {
    pub name: String,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub configuration: Option<Value>,
}

fn default_active() -> bool {
    true
}

/// Partial agent update
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateAgentRequest {
    pub name: Option<String>,
    pub system_prompt: Option<String>,
    pub is_active: Option<bool>,
    pub configuration: Option<Value>,
}

async fn list_agents(
    CurrentTenant(tenant): CurrentTenant,
    Extension(state): Extension<AppState>,
) -> ApiResult<Vec<AiAgent>> {
    ok(state.db.list_agents(tenant.id).await?)
}

async fn create_agent(
    CurrentTenant(tenant): CurrentTenant,
    Extension(state): Extension<AppState>,
    ApiJson(request): ApiJson<CreateAgentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AiAgent>>), ApiError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("name is required".to_string()));
    }

    let mut agent = AiAgent::new(tenant.id, name, request.system_prompt);
    agent.is_active = request.is_active;
    if let Some(configuration) = request.configuration {
        agent.configuration = configuration;
    }
    state.db.insert_agent(&agent).await?;

    info!(tenant_id = %tenant.id, agent_id = %agent.id, "Agent created");
    Ok((StatusCode::CREATED, Json(ApiResponse::success(agent))))
}

async fn update_agent(
    CurrentTenant(tenant): CurrentTenant,
    Extension(state): Extension<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateAgentRequest>,
) -> ApiResult<AiAgent> {
    let mut agent = state.db.get_agent(tenant.id, id).await?;

    if let Some(name) = request.name {
        if name.trim().is_empty() {
            return Err(ApiError::BadRequest("name cannot be empty".to_string()));
        }
        agent.name = name.trim().to_string();
    }
    if let Some(prompt) = request.system_prompt {
        agent.system_prompt = prompt;
    }
    if let Some(active) = request.is_active {
        agent.is_active = active;
    }
    if let Some(configuration) = request.configuration {
        agent.configuration = configuration;
    }

    state.db.update_agent(&agent).await?;
    ok(state.db.get_agent(tenant.id, id).await?)
}

async fn delete_agent(
    CurrentTenant(tenant): CurrentTenant,
    Extension(state): Extension<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Value> {
    state.db.delete_agent(tenant.id, id).await?;
    info!(tenant_id = %tenant.id, agent_id = %id, "Agent deleted");
    ok(json!({ "deleted": true }))
}

/// Create agent routes
pub fn agents_routes() -> Router {
    Router::new()
        .route("/api/v1/agents", get(list_agents).post(create_agent))
        .route("/api/v1/agents/:id", put(update_agent).delete(delete_agent))
}
