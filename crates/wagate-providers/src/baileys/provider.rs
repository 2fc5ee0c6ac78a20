use super::config::BaileysConfig;
use super::types::{
    InitializeRequest, SendAudioRequest, SendLocationRequest, SendMediaRequest, SendResponse,
    SendTextRequest, StatusResponse,
};
use crate::error::{Error, Result};
use crate::phone::{normalize, session_key};
use crate::provider::WhatsAppProvider;
use crate::types::{
    AudioMessage, LocationMessage, MediaMessage, MessageResult, ProviderType, SessionState,
    SessionStatus,
};
use crate::util::mask_for_logging;

use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// WhatsApp provider backed by the Baileys Node.js bridge
pub struct BaileysProvider {
    config: BaileysConfig,
    client: reqwest::Client,
}

impl BaileysProvider {
    /// Create a new Baileys provider
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: BaileysConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {e}")))?;

        info!(base_url = %config.base_url, "Baileys provider initialized");

        Ok(Self { config, client })
    }

    /// Bridge base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn to_status(session_id: &str, phone: &str, resp: StatusResponse) -> SessionStatus {
        let state = resp
            .status
            .as_deref()
            .map(SessionState::from_remote)
            .unwrap_or(SessionState::Initializing);

        let mut status = SessionStatus::new(phone, state)
            .with_session_id(resp.session_id.unwrap_or_else(|| session_id.to_string()))
            .with_qr_code(resp.qr_code)
            .with_provider(ProviderType::Baileys);

        if let Some(error) = resp.error {
            status = status.with_message(error);
        }
        status
    }

    /// POST a send request and fold every failure into a `MessageResult`
    async fn post_send<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> MessageResult {
        let url = self.config.url(path);

        let resp = match self.client.post(&url).json(body).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(url = %url, error = %e, "Baileys bridge unreachable");
                return MessageResult::failed(format!("Failed to reach bridge: {e}"));
            }
        };

        let http_status = resp.status();
        match resp.json::<SendResponse>().await {
            Ok(SendResponse {
                success: true,
                message_id,
                ..
            }) => {
                let id = message_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
                debug!(message_id = %id, "Message accepted by bridge");
                MessageResult::sent(id)
            }
            Ok(SendResponse { error, .. }) => {
                MessageResult::failed(error.unwrap_or_else(|| "Unknown error".to_string()))
            }
            Err(e) => MessageResult::failed(format!(
                "Invalid send response (HTTP {}): {}",
                http_status.as_u16(),
                e
            )),
        }
    }
}

#[async_trait::async_trait]
impl WhatsAppProvider for BaileysProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Baileys
    }

    #[instrument(skip(self))]
    async fn initialize(&self, tenant_id: &str, phone_number: &str) -> Result<SessionStatus> {
        let phone = normalize(phone_number);
        let session_id = session_key(tenant_id, &phone);

        let resp: StatusResponse = self
            .client
            .post(self.config.url("/api/sessions/initialize"))
            .json(&InitializeRequest {
                session_id: &session_id,
                phone_number: &phone,
                tenant_id,
            })
            .send()
            .await
            .map_err(|e| Error::Bridge(format!("Failed to initialize session: {}", e)))?
            .json()
            .await
            .map_err(|e| Error::Bridge(format!("Invalid initialize response: {}", e)))?;

        if !resp.success {
            let reason = resp
                .error
                .unwrap_or_else(|| "Bridge refused to initialize session".to_string());
            warn!(session_id = %session_id, reason = %reason, "Session initialization failed");
            return Ok(SessionStatus::new(&phone, SessionState::Failed)
                .with_session_id(&session_id)
                .with_provider(ProviderType::Baileys)
                .with_message(reason));
        }

        let mut status = Self::to_status(&session_id, &phone, resp);
        if status.is_connected() || status.qr_code.is_some() {
            info!(session_id = %session_id, state = %status.state, "Session initialized");
            return Ok(status);
        }

        // The bridge generates the QR asynchronously; poll briefly for it
        for attempt in 1..=self.config.qr_poll_attempts {
            tokio::time::sleep(self.config.qr_poll_interval()).await;

            match self.get_status(&session_id).await {
                Ok(polled) => {
                    status = polled;
                    if status.is_connected() || status.qr_code.is_some() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(attempt, session_id = %session_id, error = %e, "QR poll failed");
                }
            }
        }

        info!(session_id = %session_id, state = %status.state, has_qr = status.qr_code.is_some(), "Session initialized");
        Ok(status)
    }

    async fn send_text(&self, session_id: &str, to: &str, text: &str) -> MessageResult {
        let to = normalize(to);
        debug!(session_id, to = %to, text = %mask_for_logging(text), "Sending text via Baileys");

        self.post_send(
            "/api/messages/send-text",
            &SendTextRequest {
                session_id,
                to: &to,
                message: text,
            },
        )
        .await
    }

    async fn send_media(&self, session_id: &str, message: &MediaMessage) -> MessageResult {
        let to = normalize(&message.to);

        self.post_send(
            "/api/messages/send-media",
            &SendMediaRequest {
                session_id,
                to: &to,
                media_url: &message.media_url,
                media_type: message.media_type.as_str(),
                caption: message.caption.as_deref(),
                file_name: message.file_name.as_deref(),
            },
        )
        .await
    }

    async fn send_location(&self, session_id: &str, message: &LocationMessage) -> MessageResult {
        let to = normalize(&message.to);

        self.post_send(
            "/api/messages/send-location",
            &SendLocationRequest {
                session_id,
                to: &to,
                latitude: message.latitude,
                longitude: message.longitude,
                name: message.name.as_deref(),
                address: message.address.as_deref(),
            },
        )
        .await
    }

    async fn send_audio(&self, session_id: &str, message: &AudioMessage) -> MessageResult {
        let to = normalize(&message.to);

        self.post_send(
            "/api/messages/send-audio",
            &SendAudioRequest {
                session_id,
                to: &to,
                audio_url: &message.audio_url,
                ptt: message.ptt,
            },
        )
        .await
    }

    async fn get_status(&self, session_id: &str) -> Result<SessionStatus> {
        let url = self
            .config
            .url(&format!("/api/sessions/{}/status", session_id));

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Bridge(format!("Failed to check status: {}", e)))?;

        let phone = crate::phone::parse_session_key(session_id)
            .map(|(_, phone)| phone)
            .unwrap_or_default();

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(SessionStatus::not_found(phone)
                .with_session_id(session_id)
                .with_provider(ProviderType::Baileys));
        }

        let body: StatusResponse = resp
            .json()
            .await
            .map_err(|e| Error::Bridge(format!("Invalid status response: {}", e)))?;

        let phone = body.phone_number.as_deref().map(normalize).unwrap_or(phone);
        Ok(Self::to_status(session_id, &phone, body))
    }

    async fn disconnect(&self, session_id: &str) -> Result<()> {
        let url = self.config.url(&format!("/api/sessions/{}", session_id));

        let resp = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| Error::Bridge(format!("Failed to disconnect: {}", e)))?;

        let status = resp.status();
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(Error::Bridge(format!(
                "Disconnect rejected with HTTP {}",
                status.as_u16()
            )));
        }

        info!(session_id, "Baileys session disconnected");
        Ok(())
    }
}
