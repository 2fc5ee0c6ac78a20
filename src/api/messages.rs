//! Message endpoints
//!
//! POST /api/v1/messages/text       - Send text
//! POST /api/v1/messages/media      - Send image, video or document
//! POST /api/v1/messages/location   - Send a location pin
//! POST /api/v1/messages/audio      - Send audio or a voice note
//! GET  /api/v1/messages            - List (?phone=&limit=&offset=)
//! GET  /api/v1/messages/:message_id - One message

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use wagate_core::{Message, MessageQuery};
use wagate_providers::{AudioMessage, LocationMessage, MediaMessage, MediaType};

use super::{ok, ApiError, ApiJson, ApiPath, ApiQuery, ApiResult, AppState};
use crate::middleware::CurrentTenant;

/// Send text
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTextRequest {
    /// Tenant session phone number to send from
    pub from: String,
    pub to: String,
    pub text: String,
}

/// Send media; `mediaType` wins over `mimeType` when both are given
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMediaRequest {
    pub from: String,
    pub to: String,
    pub media_url: String,
    #[serde(default)]
    pub media_type: Option<MediaType>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
}

/// Send a location
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendLocationRequest {
    pub from: String,
    pub to: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Send audio
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendAudioRequest {
    pub from: String,
    pub to: String,
    pub audio_url: String,
    #[serde(default)]
    pub ptt: bool,
}

async fn send_text(
    CurrentTenant(tenant): CurrentTenant,
    Extension(state): Extension<AppState>,
    ApiJson(request): ApiJson<SendTextRequest>,
) -> ApiResult<Message> {
    ok(state
        .messages
        .send_text(&tenant, &request.from, &request.to, &request.text)
        .await?)
}

async fn send_media(
    CurrentTenant(tenant): CurrentTenant,
    Extension(state): Extension<AppState>,
    ApiJson(request): ApiJson<SendMediaRequest>,
) -> ApiResult<Message> {
    let media_type = match (request.media_type, request.mime_type.as_deref()) {
        (Some(media_type), _) => media_type,
        (None, Some(mime)) => MediaType::from_mime(mime),
        (None, None) => {
            return Err(ApiError::BadRequest(
                "mediaType or mimeType is required".to_string(),
            ))
        }
    };

    let media = MediaMessage {
        to: request.to,
        media_url: request.media_url,
        media_type,
        caption: request.caption,
        file_name: request.file_name,
    };
    ok(state.messages.send_media(&tenant, &request.from, media).await?)
}

async fn send_location(
    CurrentTenant(tenant): CurrentTenant,
    Extension(state): Extension<AppState>,
    ApiJson(request): ApiJson<SendLocationRequest>,
) -> ApiResult<Message> {
    let location = LocationMessage {
        to: request.to,
        latitude: request.latitude,
        longitude: request.longitude,
        name: request.name,
        address: request.address,
    };
    ok(state
        .messages
        .send_location(&tenant, &request.from, location)
        .await?)
}

async fn send_audio(
    CurrentTenant(tenant): CurrentTenant,
    Extension(state): Extension<AppState>,
    ApiJson(request): ApiJson<SendAudioRequest>,
) -> ApiResult<Message> {
    let audio = AudioMessage {
        to: request.to,
        audio_url: request.audio_url,
        ptt: request.ptt,
    };
    ok(state.messages.send_audio(&tenant, &request.from, audio).await?)
}

async fn list_messages(
    CurrentTenant(tenant): CurrentTenant,
    Extension(state): Extension<AppState>,
    ApiQuery(query): ApiQuery<MessageQuery>,
) -> ApiResult<Vec<Message>> {
    ok(state.messages.list_messages(tenant.id, &query).await?)
}

async fn get_message(
    CurrentTenant(tenant): CurrentTenant,
    Extension(state): Extension<AppState>,
    ApiPath(message_id): ApiPath<String>,
) -> ApiResult<Message> {
    ok(state.messages.get_message(tenant.id, &message_id).await?)
}

/// Create message routes
pub fn messages_routes() -> Router {
    Router::new()
        .route("/api/v1/messages", get(list_messages))
        .route("/api/v1/messages/text", post(send_text))
        .route("/api/v1/messages/media", post(send_media))
        .route("/api/v1/messages/location", post(send_location))
        .route("/api/v1/messages/audio", post(send_audio))
        .route("/api/v1/messages/:message_id", get(get_message))
}
