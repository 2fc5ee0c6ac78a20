//! Inbound webhooks from the providers
//!
//! POST /api/v1/webhooks/baileys - Bridge events
//! GET  /api/v1/webhooks/meta    - Cloud API subscription verification
//! POST /api/v1/webhooks/meta    - Cloud API messages and receipts
//!
//! Event handlers answer 200 even when the body is malformed or processing
//! fails so the sender does not retry; failures are logged.

use axum::{
    body::Bytes,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::DateTime;
use serde::Deserialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use wagate_core::{Error, IncomingMessage, MessageType, Result};
use wagate_providers::baileys::{BridgeConnectionUpdate, BridgeEvent, BridgeIncomingMessage, BridgeStatusUpdate};
use wagate_providers::phone::{from_jid, parse_session_key};
use wagate_providers::{MessageStatus, MetaWebhook, ProviderType, SessionState};

use super::{ApiQuery, AppState};

/// Meta webhook verification query
#[derive(Debug, Deserialize)]
pub struct WebhookVerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

async fn handle_bridge_message(state: &AppState, session_key: &str, data: serde_json::Value) -> Result<()> {
    let message: BridgeIncomingMessage = serde_json::from_value(data)?;
    if message.is_group {
        debug!(message_id = %message.id, "Ignoring group message");
        return Ok(());
    }

    let (tenant_id, phone) = parse_session_key(session_key)?;
    let tenant_id =
        Uuid::parse_str(&tenant_id).map_err(|e| Error::InvalidInput(e.to_string()))?;
    let tenant = state.db.get_tenant(tenant_id).await?;

    let incoming = IncomingMessage {
        message_id: message.id,
        to: phone,
        from: from_jid(&message.from),
        sender_name: message.push_name,
        message_type: MessageType::from_remote(&message.message_type),
        text: message.text,
        timestamp: message.timestamp.and_then(|ts| DateTime::from_timestamp(ts, 0)),
    };
    state.messages.handle_incoming(&tenant, incoming).await?;
    Ok(())
}

async fn handle_bridge_event(state: &AppState, event: BridgeEvent) -> Result<()> {
    match event.event.as_str() {
        "message" => handle_bridge_message(state, &event.session_id, event.data).await,
        "message.status" => {
            let update: BridgeStatusUpdate = serde_json::from_value(event.data)?;
            let status: MessageStatus = update.status.parse()?;
            state
                .messages
                .apply_remote_status(&update.message_id, status)
                .await?;
            Ok(())
        }
        "connection.update" => {
            let update: BridgeConnectionUpdate = serde_json::from_value(event.data)?;
            let session = state
                .sessions
                .apply_remote_status(
                    &event.session_id,
                    SessionState::from_remote(&update.status),
                    update.qr_code,
                )
                .await?;

            let tenant = state.db.get_tenant(session.tenant_id).await?;
            let payload = serde_json::to_value(session.to_status()).unwrap_or_default();
            state.webhooks.notify(&tenant, "session.status", payload);
            Ok(())
        }
        other => {
            debug!(event = other, "Ignoring bridge event");
            Ok(())
        }
    }
}

/// Handle a Baileys bridge event
async fn baileys_webhook(Extension(state): Extension<AppState>, body: Bytes) -> StatusCode {
    let event: BridgeEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "Malformed bridge event");
            return StatusCode::OK;
        }
    };
    info!(event = %event.event, session_id = %event.session_id, "Received bridge event");

    if let Err(e) = handle_bridge_event(&state, event).await {
        error!(error = %e, "Failed to process bridge event");
    }

    StatusCode::OK
}

/// Verify the Meta webhook subscription (GET)
async fn meta_verify(
    ApiQuery(query): ApiQuery<WebhookVerifyQuery>,
    Extension(state): Extension<AppState>,
) -> impl IntoResponse {
    let mode = query.mode.as_deref().unwrap_or("");
    let token = query.verify_token.as_deref().unwrap_or("");
    let challenge = query.challenge.as_deref().unwrap_or("");

    match state.meta.verify_webhook(mode, token, challenge) {
        Some(c) => c.into_response(),
        None => (StatusCode::FORBIDDEN, "Verification failed").into_response(),
    }
}

async fn handle_meta_webhook(state: &AppState, payload: &MetaWebhook) -> Result<()> {
    for inbound in state.meta.extract_messages(payload) {
        let Some(session) = state
            .db
            .find_session_by_provider_phone(ProviderType::MetaApi, &inbound.business_phone)
            .await?
        else {
            warn!(phone = %inbound.business_phone, "No Cloud API session for business number");
            continue;
        };
        let tenant = state.db.get_tenant(session.tenant_id).await?;

        let incoming = IncomingMessage {
            message_id: inbound.message_id,
            to: session.phone_number,
            from: inbound.from,
            sender_name: inbound.sender_name,
            message_type: MessageType::Text,
            text: Some(inbound.text),
            timestamp: inbound.timestamp.and_then(|ts| DateTime::from_timestamp(ts, 0)),
        };
        if let Err(e) = state.messages.handle_incoming(&tenant, incoming).await {
            error!(tenant_id = %tenant.id, error = %e, "Failed to store Cloud API message");
        }
    }

    for receipt in state.meta.extract_statuses(payload) {
        match receipt.status.parse::<MessageStatus>() {
            Ok(status) => {
                if let Err(e) = state
                    .messages
                    .apply_remote_status(&receipt.message_id, status)
                    .await
                {
                    error!(message_id = %receipt.message_id, error = %e, "Failed to apply receipt");
                }
            }
            Err(e) => warn!(status = %receipt.status, error = %e, "Unknown receipt status"),
        }
    }

    Ok(())
}

/// Handle a Meta Cloud API webhook (POST)
async fn meta_webhook(Extension(state): Extension<AppState>, body: Bytes) -> StatusCode {
    let payload: MetaWebhook = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Malformed Cloud API webhook");
            return StatusCode::OK;
        }
    };
    info!("Received Cloud API webhook");

    if let Err(e) = handle_meta_webhook(&state, &payload).await {
        error!(error = %e, "Failed to process Cloud API webhook");
    }

    StatusCode::OK
}

/// Create webhook routes
pub fn webhooks_routes() -> Router {
    Router::new()
        .route("/api/v1/webhooks/baileys", post(baileys_webhook))
        .route("/api/v1/webhooks/meta", get(meta_verify).post(meta_webhook))
}
