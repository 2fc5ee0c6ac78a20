use super::config::MetaApiConfig;
use super::types::{ApiResponse, MetaInboundMessage, MetaStatusUpdate, MetaWebhook};
use crate::error::{Error, Result};
use crate::phone::normalize;
use crate::provider::WhatsAppProvider;
use crate::types::{
    AudioMessage, LocationMessage, MediaMessage, MessageResult, ProviderType, SessionState,
    SessionStatus,
};
use crate::util::mask_for_logging;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

const NOT_CONFIGURED: &str = "Meta API credentials are not configured";

/// WhatsApp provider backed by the Meta Business Cloud API
pub struct MetaApiProvider {
    config: MetaApiConfig,
    client: reqwest::Client,
}

impl MetaApiProvider {
    /// Create a new Meta Cloud API provider
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: MetaApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {e}")))?;

        if config.is_configured() {
            info!(api_version = %config.api_version, "Meta Cloud API provider initialized");
        } else {
            info!("Meta Cloud API provider registered without credentials");
        }

        Ok(Self { config, client })
    }

    /// Whether credentials are present
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        match (&self.config.access_token, &self.config.phone_number_id) {
            (Some(token), Some(id)) if !token.is_empty() && !id.is_empty() => {
                Ok((token.as_str(), id.as_str()))
            }
            _ => Err(Error::NotConfigured(NOT_CONFIGURED.to_string())),
        }
    }

    /// Verify webhook (for initial webhook setup)
    pub fn verify_webhook(&self, mode: &str, token: &str, challenge: &str) -> Option<String> {
        if mode == "subscribe" && token == self.config.verify_token {
            info!("Meta webhook verified");
            Some(challenge.to_string())
        } else {
            warn!(mode, "Meta webhook verification rejected");
            None
        }
    }

    /// Extract inbound text messages from a webhook payload
    pub fn extract_messages(&self, webhook: &MetaWebhook) -> Vec<MetaInboundMessage> {
        let mut messages = Vec::new();

        for entry in &webhook.entry {
            for change in &entry.changes {
                if change.field != "messages" {
                    continue;
                }

                let business_phone = normalize(&change.value.metadata.display_phone_number);
                let sender_name = change
                    .value
                    .contacts
                    .first()
                    .and_then(|c| c.profile.as_ref())
                    .map(|p| p.name.clone());

                for msg in &change.value.messages {
                    if msg.message_type != "text" {
                        debug!(message_type = %msg.message_type, "Skipping non-text Meta message");
                        continue;
                    }
                    let Some(text) = msg.text.as_ref().map(|t| t.body.clone()) else {
                        continue;
                    };
                    if text.is_empty() {
                        continue;
                    }

                    messages.push(MetaInboundMessage {
                        business_phone: business_phone.clone(),
                        from: normalize(&msg.from),
                        sender_name: sender_name.clone(),
                        message_id: msg.id.clone(),
                        text,
                        timestamp: msg.timestamp.parse().ok(),
                    });
                }
            }
        }

        messages
    }

    /// Extract delivery receipts from a webhook payload
    pub fn extract_statuses(&self, webhook: &MetaWebhook) -> Vec<MetaStatusUpdate> {
        webhook
            .entry
            .iter()
            .flat_map(|entry| entry.changes.iter())
            .filter(|change| change.field == "messages")
            .flat_map(|change| {
                let business_phone = normalize(&change.value.metadata.display_phone_number);
                change.value.statuses.iter().map(move |s| MetaStatusUpdate {
                    business_phone: business_phone.clone(),
                    message_id: s.id.clone(),
                    status: s.status.clone(),
                })
            })
            .collect()
    }

    /// POST a message payload and fold every failure into a `MessageResult`
    async fn post_message(&self, to: &str, message_type: &str, body: Value) -> MessageResult {
        let (token, phone_number_id) = match self.credentials() {
            Ok(creds) => creds,
            Err(e) => return MessageResult::failed(e.to_string()),
        };

        let mut payload = json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": normalize(to),
            "type": message_type,
        });
        payload[message_type] = body;

        let url = self.config.messages_url(phone_number_id);
        let resp = match self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, "Meta Cloud API unreachable");
                return MessageResult::failed(format!("Failed to send message: {e}"));
            }
        };

        let resp: ApiResponse = match resp.json().await {
            Ok(resp) => resp,
            Err(e) => return MessageResult::failed(format!("Invalid API response: {e}")),
        };

        if let Some(error) = resp.error {
            return MessageResult::failed(format!("API error {}: {}", error.code, error.message));
        }

        match resp.messages.and_then(|m| m.into_iter().next()) {
            Some(info) => MessageResult::sent(info.id),
            None => MessageResult::failed("API response carried no message id"),
        }
    }
}

#[async_trait::async_trait]
impl WhatsAppProvider for MetaApiProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::MetaApi
    }

    async fn initialize(&self, _tenant_id: &str, phone_number: &str) -> Result<SessionStatus> {
        let phone = normalize(phone_number);
        let status = match self.credentials() {
            // Cloud API numbers are registered in Business Manager; there is no pairing step
            Ok((_, phone_number_id)) => SessionStatus::new(&phone, SessionState::Connected)
                .with_session_id(phone_number_id),
            Err(e) => SessionStatus::new(&phone, SessionState::Failed).with_message(e.to_string()),
        };
        Ok(status.with_provider(ProviderType::MetaApi))
    }

    async fn send_text(&self, _session_id: &str, to: &str, text: &str) -> MessageResult {
        debug!(to, text = %mask_for_logging(text), "Sending text via Meta Cloud API");
        self.post_message(to, "text", json!({ "body": text })).await
    }

    async fn send_media(&self, _session_id: &str, message: &MediaMessage) -> MessageResult {
        let mut body = json!({ "link": message.media_url });
        if let Some(caption) = &message.caption {
            body["caption"] = json!(caption);
        }
        if let Some(file_name) = &message.file_name {
            body["filename"] = json!(file_name);
        }
        self.post_message(&message.to, message.media_type.as_str(), body)
            .await
    }

    async fn send_location(&self, _session_id: &str, message: &LocationMessage) -> MessageResult {
        let mut body = json!({
            "latitude": message.latitude,
            "longitude": message.longitude,
        });
        if let Some(name) = &message.name {
            body["name"] = json!(name);
        }
        if let Some(address) = &message.address {
            body["address"] = json!(address);
        }
        self.post_message(&message.to, "location", body).await
    }

    async fn send_audio(&self, _session_id: &str, message: &AudioMessage) -> MessageResult {
        self.post_message(&message.to, "audio", json!({ "link": message.audio_url }))
            .await
    }

    async fn get_status(&self, session_id: &str) -> Result<SessionStatus> {
        self.credentials()?;
        Ok(SessionStatus::new("", SessionState::Connected)
            .with_session_id(session_id)
            .with_provider(ProviderType::MetaApi))
    }

    async fn disconnect(&self, session_id: &str) -> Result<()> {
        debug!(session_id, "Meta Cloud API sessions have no socket to close");
        Ok(())
    }
}
