//! Message dispatch and inbound handling
//!
//! Outbound sends go through the provider serving the sender's session and
//! are always persisted, failed ones included. Inbound messages are stored
//! once per provider message id, announced to the tenant's webhook, and
//! optionally answered by the tenant's AI agent in the background.

use crate::agent::{AgentResponder, MAX_CONTEXT_TURNS};
use crate::error::{Error, Result};
use crate::factory::ProviderFactory;
use crate::models::{
    AiConversation, ConversationTurn, IncomingMessage, Message, MessageDirection, MessageType,
    Tenant, WhatsAppSession,
};
use crate::store::Database;
use crate::webhook::WebhookDeliveryService;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use wagate_providers::phone::normalize;
use wagate_providers::util::{mask_for_logging, split_message, WHATSAPP_MESSAGE_LIMIT};
use wagate_providers::{
    AudioMessage, LocationMessage, MediaMessage, MessageResult, MessageStatus, SharedProvider,
    WhatsAppProvider,
};

/// Default page size for message listings
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Largest page a caller may request
pub const MAX_PAGE_SIZE: i64 = 200;

/// What to send
#[derive(Debug, Clone, PartialEq)]
pub enum OutgoingContent {
    /// Plain text
    Text {
        /// Recipient
        to: String,
        /// Body
        text: String,
    },
    /// Image, video or document
    Media(MediaMessage),
    /// Location pin
    Location(LocationMessage),
    /// Audio file or voice note
    Audio(AudioMessage),
}

impl OutgoingContent {
    /// Recipient phone number
    #[must_use]
    pub fn to(&self) -> &str {
        match self {
            Self::Text { to, .. } => to,
            Self::Media(m) => &m.to,
            Self::Location(m) => &m.to,
            Self::Audio(m) => &m.to,
        }
    }

    /// Stored message kind
    #[must_use]
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Text { .. } => MessageType::Text,
            Self::Media(_) => MessageType::Media,
            Self::Location(_) => MessageType::Location,
            Self::Audio(_) => MessageType::Audio,
        }
    }

    /// Payload stored in the `content` column
    #[must_use]
    pub fn content_json(&self) -> Value {
        match self {
            Self::Text { text, .. } => json!({ "text": text }),
            Self::Media(m) => json!({
                "mediaUrl": m.media_url,
                "mediaType": m.media_type.as_str(),
                "caption": m.caption,
                "fileName": m.file_name,
            }),
            Self::Location(m) => json!({
                "latitude": m.latitude,
                "longitude": m.longitude,
                "name": m.name,
                "address": m.address,
            }),
            Self::Audio(m) => json!({ "audioUrl": m.audio_url, "ptt": m.ptt }),
        }
    }

    fn with_normalized_recipient(mut self) -> Self {
        let to = normalize(self.to());
        match &mut self {
            Self::Text { to: t, .. } => *t = to,
            Self::Media(m) => m.to = to,
            Self::Location(m) => m.to = to,
            Self::Audio(m) => m.to = to,
        }
        self
    }

    fn validate(&self) -> Result<()> {
        if self.to().is_empty() {
            return Err(Error::InvalidInput("recipient is required".to_string()));
        }

        match self {
            Self::Text { text, .. } if text.trim().is_empty() => {
                Err(Error::InvalidInput("text is required".to_string()))
            }
            Self::Text { text, .. } if text.chars().count() > WHATSAPP_MESSAGE_LIMIT => {
                Err(Error::InvalidInput(format!(
                    "text exceeds {WHATSAPP_MESSAGE_LIMIT} characters"
                )))
            }
            Self::Media(m) if m.media_url.is_empty() => {
                Err(Error::InvalidInput("mediaUrl is required".to_string()))
            }
            Self::Audio(m) if m.audio_url.is_empty() => {
                Err(Error::InvalidInput("audioUrl is required".to_string()))
            }
            Self::Location(m)
                if !(-90.0..=90.0).contains(&m.latitude)
                    || !(-180.0..=180.0).contains(&m.longitude) =>
            {
                Err(Error::InvalidInput("coordinates out of range".to_string()))
            }
            _ => Ok(()),
        }
    }

    async fn send_via(&self, provider: &dyn WhatsAppProvider, session_id: &str) -> MessageResult {
        match self {
            Self::Text { to, text } => provider.send_text(session_id, to, text).await,
            Self::Media(m) => provider.send_media(session_id, m).await,
            Self::Location(m) => provider.send_location(session_id, m).await,
            Self::Audio(m) => provider.send_audio(session_id, m).await,
        }
    }
}

/// Filter and paging for message listings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MessageQuery {
    /// Only messages of the session on this phone number
    pub phone: Option<String>,
    /// Page size (default 50, at most 200)
    pub limit: Option<i64>,
    /// Rows to skip
    pub offset: Option<i64>,
}

impl MessageQuery {
    /// Page size after defaults and clamping
    #[must_use]
    pub fn effective_limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    /// Offset, never negative
    #[must_use]
    pub fn effective_offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

fn event_payload(message: &Message) -> Value {
    serde_json::to_value(message).unwrap_or_default()
}

/// Message operations
#[derive(Clone)]
pub struct MessageService {
    db: Database,
    factory: Arc<ProviderFactory>,
    webhooks: Arc<WebhookDeliveryService>,
    responder: Arc<dyn AgentResponder>,
}

impl MessageService {
    /// Create the service
    pub fn new(
        db: Database,
        factory: Arc<ProviderFactory>,
        webhooks: Arc<WebhookDeliveryService>,
        responder: Arc<dyn AgentResponder>,
    ) -> Self {
        Self {
            db,
            factory,
            webhooks,
            responder,
        }
    }

    /// Active session for a sender, with its provider and provider session id
    async fn resolve_session(
        &self,
        tenant_id: Uuid,
        from_phone: &str,
    ) -> Result<(WhatsAppSession, SharedProvider, String)> {
        let phone = normalize(from_phone);
        let session = self
            .db
            .find_session(tenant_id, &phone)
            .await?
            .ok_or_else(|| Error::NotFound(format!("session {}", phone)))?;

        if !session.is_active {
            return Err(Error::SessionInactive(phone));
        }
        let session_id = session
            .session_data
            .session_id
            .clone()
            .ok_or_else(|| Error::SessionInactive(phone.clone()))?;
        let provider = self.factory.get_provider(session.provider_type)?;

        Ok((session, provider, session_id))
    }

    #[instrument(skip(self, tenant, content), fields(tenant_id = %tenant.id))]
    async fn send(&self, tenant: &Tenant, from_phone: &str, content: OutgoingContent) -> Result<Message> {
        let content = content.with_normalized_recipient();
        content.validate()?;

        let (session, provider, session_id) = self.resolve_session(tenant.id, from_phone).await?;
        let result = content.send_via(provider.as_ref(), &session_id).await;

        let now = Utc::now();
        let message = Message {
            id: Uuid::new_v4(),
            tenant_id: tenant.id,
            session_id: session.id,
            message_id: result
                .message_id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            direction: MessageDirection::Outbound,
            from_number: session.phone_number.clone(),
            to_number: content.to().to_string(),
            message_type: content.message_type(),
            content: content.content_json(),
            status: result.status,
            error: result.error.clone(),
            created_at: now,
            updated_at: now,
        };
        if !self.db.insert_message(&message).await? {
            return Err(Error::Internal(format!(
                "outbound message {} already stored",
                message.message_id
            )));
        }

        let event = if result.is_success() {
            info!(message_id = %message.message_id, kind = message.message_type.as_str(), to = %message.to_number, "Message sent");
            "message.sent"
        } else {
            warn!(message_id = %message.message_id, error = ?result.error, "Message send failed");
            "message.failed"
        };
        self.webhooks.notify(tenant, event, event_payload(&message));

        Ok(message)
    }

    /// Send a text message from one of the tenant's sessions
    pub async fn send_text(&self, tenant: &Tenant, from_phone: &str, to: &str, text: &str) -> Result<Message> {
        debug!(text = %mask_for_logging(text), "Sending text");
        self.send(
            tenant,
            from_phone,
            OutgoingContent::Text {
                to: to.to_string(),
                text: text.to_string(),
            },
        )
        .await
    }

    /// Send an image, video or document
    pub async fn send_media(&self, tenant: &Tenant, from_phone: &str, media: MediaMessage) -> Result<Message> {
        self.send(tenant, from_phone, OutgoingContent::Media(media)).await
    }

    /// Send a location pin
    pub async fn send_location(
        &self,
        tenant: &Tenant,
        from_phone: &str,
        location: LocationMessage,
    ) -> Result<Message> {
        self.send(tenant, from_phone, OutgoingContent::Location(location)).await
    }

    /// Send an audio file or voice note
    pub async fn send_audio(&self, tenant: &Tenant, from_phone: &str, audio: AudioMessage) -> Result<Message> {
        self.send(tenant, from_phone, OutgoingContent::Audio(audio)).await
    }

    /// Store an inbound message. Returns `None` for a message id already seen.
    #[instrument(skip(self, tenant, incoming), fields(tenant_id = %tenant.id, message_id = %incoming.message_id))]
    pub async fn handle_incoming(&self, tenant: &Tenant, incoming: IncomingMessage) -> Result<Option<Message>> {
        let phone = normalize(&incoming.to);
        let session = self
            .db
            .find_session(tenant.id, &phone)
            .await?
            .ok_or_else(|| Error::NotFound(format!("session {}", phone)))?;

        let received_at = incoming.timestamp.unwrap_or_else(Utc::now);
        let message = Message {
            id: Uuid::new_v4(),
            tenant_id: tenant.id,
            session_id: session.id,
            message_id: incoming.message_id.clone(),
            direction: MessageDirection::Inbound,
            from_number: normalize(&incoming.from),
            to_number: phone,
            message_type: incoming.message_type,
            content: json!({
                "text": incoming.text,
                "senderName": incoming.sender_name,
            }),
            status: MessageStatus::Delivered,
            error: None,
            created_at: received_at,
            updated_at: received_at,
        };

        if !self.db.insert_message(&message).await? {
            debug!("Duplicate inbound message ignored");
            return Ok(None);
        }

        info!(
            from = %message.from_number,
            text = %mask_for_logging(incoming.text.as_deref().unwrap_or_default()),
            "Message received"
        );
        self.webhooks
            .notify(tenant, "message.received", event_payload(&message));

        if tenant.settings.ai_enabled && message.message_type == MessageType::Text {
            let service = self.clone();
            let tenant = tenant.clone();
            let inbound = message.clone();
            tokio::spawn(async move {
                if let Err(e) = service.reply_with_agent(&tenant, &session, &inbound).await {
                    warn!(tenant_id = %tenant.id, error = %e, "Agent reply failed");
                }
            });
        }

        Ok(Some(message))
    }

    /// Answer an inbound text with the tenant's active agent.
    ///
    /// Returns the last outbound message sent, or `None` when the tenant has
    /// no active agent or the message has no text.
    pub async fn reply_with_agent(
        &self,
        tenant: &Tenant,
        session: &WhatsAppSession,
        inbound: &Message,
    ) -> Result<Option<Message>> {
        let Some(agent) = self.db.active_agent(tenant.id).await? else {
            debug!(tenant_id = %tenant.id, "No active agent");
            return Ok(None);
        };
        let Some(text) = inbound.content.get("text").and_then(Value::as_str) else {
            return Ok(None);
        };

        let mut conversation = self
            .db
            .get_conversation(agent.id, &inbound.from_number)
            .await?
            .unwrap_or_else(|| AiConversation::new(tenant.id, agent.id, &inbound.from_number));

        let reply = self
            .responder
            .respond(&agent, &conversation.context, text)
            .await?;

        conversation.push_turn(ConversationTurn::user(text), MAX_CONTEXT_TURNS);
        conversation.push_turn(ConversationTurn::assistant(&reply), MAX_CONTEXT_TURNS);
        self.db.save_conversation(&conversation).await?;

        let mut last = None;
        for chunk in split_message(&reply, WHATSAPP_MESSAGE_LIMIT) {
            let sent = self
                .send_text(tenant, &session.phone_number, &inbound.from_number, &chunk)
                .await?;
            let failed = sent.status == MessageStatus::Failed;
            last = Some(sent);
            if failed {
                break;
            }
        }

        info!(agent = %agent.name, to = %inbound.from_number, "Agent replied");
        Ok(last)
    }

    /// Record a delivery status change
    pub async fn update_status(
        &self,
        tenant: &Tenant,
        message_id: &str,
        status: MessageStatus,
        error: Option<&str>,
    ) -> Result<Message> {
        self.db
            .update_message_status(tenant.id, message_id, status, error)
            .await?;
        let message = self.db.get_message(tenant.id, message_id).await?;

        debug!(message_id, status = %status, "Message status updated");
        self.webhooks.notify(
            tenant,
            "message.status",
            json!({ "messageId": message_id, "status": status, "error": error }),
        );
        Ok(message)
    }

    /// Record a status change reported by a provider that does not know the
    /// tenant. Unknown message ids are ignored.
    pub async fn apply_remote_status(
        &self,
        message_id: &str,
        status: MessageStatus,
    ) -> Result<Option<Message>> {
        let Some(tenant_id) = self.db.find_message_tenant(message_id).await? else {
            debug!(message_id, "Status update for unknown message");
            return Ok(None);
        };
        let tenant = self.db.get_tenant(tenant_id).await?;
        self.update_status(&tenant, message_id, status, None)
            .await
            .map(Some)
    }

    /// Get one of the tenant's messages
    pub async fn get_message(&self, tenant_id: Uuid, message_id: &str) -> Result<Message> {
        self.db.get_message(tenant_id, message_id).await
    }

    /// Page through the tenant's messages, newest first
    pub async fn list_messages(&self, tenant_id: Uuid, query: &MessageQuery) -> Result<Vec<Message>> {
        let session_id = match query.phone.as_deref() {
            Some(phone) => match self.db.find_session(tenant_id, &normalize(phone)).await? {
                Some(session) => Some(session.id),
                None => return Ok(Vec::new()),
            },
            None => None,
        };

        self.db
            .list_messages(
                tenant_id,
                session_id,
                query.effective_limit(),
                query.effective_offset(),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::CannedResponder;
    use crate::factory::tests::FakeProvider;
    use crate::factory::DEFAULT_HEALTH_TTL;
    use crate::models::{AiAgent, TenantSettings};
    use crate::webhook::WebhookConfig;
    use std::time::Duration;
    use tempfile::TempDir;
    use wagate_providers::{MediaType, ProviderType, SessionState, SessionStatus};
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SENDER: &str = "15550001111";

    struct TestContext {
        service: MessageService,
        db: Database,
        tenant: Tenant,
        _dir: TempDir,
    }

    async fn create_test_context(provider: FakeProvider, settings: TenantSettings) -> TestContext {
        let dir = TempDir::new().unwrap();
        let db = Database::from_path(&dir.path().join("messages.db")).await.unwrap();

        let mut tenant = Tenant::new("Acme");
        tenant.settings = settings;
        db.create_tenant(&tenant).await.unwrap();

        let mut session = WhatsAppSession::new(tenant.id, SENDER, ProviderType::Baileys);
        session.apply_status(
            &SessionStatus::new(SENDER, SessionState::Connected).with_session_id("session-test"),
        );
        db.insert_session(&session).await.unwrap();

        let factory = Arc::new(ProviderFactory::new(DEFAULT_HEALTH_TTL).with_provider(Arc::new(provider)));
        let webhooks = Arc::new(
            WebhookDeliveryService::new(&WebhookConfig {
                max_retries: 0,
                ..Default::default()
            })
            .unwrap(),
        );
        let service = MessageService::new(db.clone(), factory, webhooks, Arc::new(CannedResponder));

        TestContext {
            service,
            db,
            tenant,
            _dir: dir,
        }
    }

    fn incoming(id: &str, text: &str) -> IncomingMessage {
        IncomingMessage {
            message_id: id.to_string(),
            to: SENDER.to_string(),
            from: "+1 555 999 0000".to_string(),
            sender_name: Some("Bob".to_string()),
            message_type: MessageType::Text,
            text: Some(text.to_string()),
            timestamp: None,
        }
    }

    async fn wait_for_requests(server: &MockServer, count: usize) -> Vec<wiremock::Request> {
        for _ in 0..100 {
            let requests = server.received_requests().await.unwrap();
            if requests.len() >= count {
                return requests;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        server.received_requests().await.unwrap()
    }

    #[test]
    fn test_query_limits() {
        assert_eq!(MessageQuery::default().effective_limit(), 50);
        let query = MessageQuery {
            limit: Some(1000),
            offset: Some(-5),
            ..Default::default()
        };
        assert_eq!(query.effective_limit(), 200);
        assert_eq!(query.effective_offset(), 0);
    }

    #[test]
    fn test_query_from_urlencoded() {
        let query: MessageQuery = serde_urlencoded::from_str("phone=1555&limit=10").unwrap();
        assert_eq!(query.phone.as_deref(), Some("1555"));
        assert_eq!(query.effective_limit(), 10);
    }

    #[test]
    fn test_outgoing_validation() {
        let empty = OutgoingContent::Text {
            to: "1555".to_string(),
            text: "  ".to_string(),
        };
        assert!(empty.validate().is_err());

        let far = OutgoingContent::Location(LocationMessage {
            to: "1555".to_string(),
            latitude: 91.0,
            longitude: 0.0,
            name: None,
            address: None,
        });
        assert!(far.validate().is_err());

        let ok = OutgoingContent::Text {
            to: "+1 555".to_string(),
            text: "hi".to_string(),
        }
        .with_normalized_recipient();
        assert_eq!(ok.to(), "1555");
        assert!(ok.validate().is_ok());
    }

    #[tokio::test]
    async fn test_send_text_persists_sent_message() {
        let ctx = create_test_context(FakeProvider::new(ProviderType::Baileys), TenantSettings::default()).await;

        let message = ctx
            .service
            .send_text(&ctx.tenant, "+15550001111", "+1 555 222 3333", "Hello")
            .await
            .unwrap();

        assert_eq!(message.status, MessageStatus::Sent);
        assert_eq!(message.direction, MessageDirection::Outbound);
        assert_eq!(message.to_number, "15552223333");
        assert_eq!(message.content["text"], "Hello");

        let stored = ctx.db.get_message(ctx.tenant.id, &message.message_id).await.unwrap();
        assert_eq!(stored.id, message.id);
    }

    #[tokio::test]
    async fn test_failed_send_is_persisted() {
        let mut provider = FakeProvider::new(ProviderType::Baileys);
        provider.fail_sends = true;
        let ctx = create_test_context(provider, TenantSettings::default()).await;

        let message = ctx
            .service
            .send_media(
                &ctx.tenant,
                SENDER,
                MediaMessage {
                    to: "15552223333".to_string(),
                    media_url: "https://cdn.example.com/a.png".to_string(),
                    media_type: MediaType::Image,
                    caption: None,
                    file_name: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(message.status, MessageStatus::Failed);
        assert_eq!(message.error.as_deref(), Some("not connected"));
        assert_eq!(message.content["mediaType"], "image");
        assert!(ctx.db.get_message(ctx.tenant.id, &message.message_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_send_requires_active_session() {
        let ctx = create_test_context(FakeProvider::new(ProviderType::Baileys), TenantSettings::default()).await;

        let err = ctx
            .service
            .send_text(&ctx.tenant, "19998887777", "1555", "hi")
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let mut session = ctx.db.find_session(ctx.tenant.id, SENDER).await.unwrap().unwrap();
        session.apply_status(&SessionStatus::new(SENDER, SessionState::Disconnected));
        ctx.db.update_session(&session).await.unwrap();

        let err = ctx
            .service
            .send_text(&ctx.tenant, SENDER, "1555", "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SessionInactive(_)));
    }

    #[tokio::test]
    async fn test_sent_webhook_is_signed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-webhook-event", "message.sent"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let settings = TenantSettings {
            webhook_url: Some(server.uri()),
            webhook_secret: Some("s3cret".to_string()),
            ..Default::default()
        };
        let ctx = create_test_context(FakeProvider::new(ProviderType::Baileys), settings).await;

        ctx.service
            .send_text(&ctx.tenant, SENDER, "15552223333", "Hello")
            .await
            .unwrap();

        let requests = wait_for_requests(&server, 1).await;
        assert_eq!(requests.len(), 1);
        let signature = requests[0]
            .headers
            .get(crate::webhook::SIGNATURE_HEADER)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(crate::webhook::verify_signature("s3cret", &requests[0].body, signature));
    }

    #[tokio::test]
    async fn test_incoming_duplicate_is_ignored() {
        let ctx = create_test_context(FakeProvider::new(ProviderType::Baileys), TenantSettings::default()).await;

        let first = ctx
            .service
            .handle_incoming(&ctx.tenant, incoming("wamid.1", "hi"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.direction, MessageDirection::Inbound);
        assert_eq!(first.from_number, "15559990000");
        assert_eq!(first.content["senderName"], "Bob");

        let second = ctx
            .service
            .handle_incoming(&ctx.tenant, incoming("wamid.1", "hi"))
            .await
            .unwrap();
        assert!(second.is_none());

        let all = ctx
            .service
            .list_messages(ctx.tenant.id, &MessageQuery::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_incoming_for_unknown_session() {
        let ctx = create_test_context(FakeProvider::new(ProviderType::Baileys), TenantSettings::default()).await;
        let mut msg = incoming("wamid.2", "hi");
        msg.to = "19990000000".to_string();

        assert!(ctx
            .service
            .handle_incoming(&ctx.tenant, msg)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_incoming_notifies_webhook() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-webhook-event", "message.received"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let settings = TenantSettings {
            webhook_url: Some(server.uri()),
            ..Default::default()
        };
        let ctx = create_test_context(FakeProvider::new(ProviderType::Baileys), settings).await;

        ctx.service
            .handle_incoming(&ctx.tenant, incoming("wamid.3", "hello there"))
            .await
            .unwrap();

        let requests = wait_for_requests(&server, 1).await;
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["event"], "message.received");
        assert_eq!(body["data"]["messageId"], "wamid.3");
    }

    #[tokio::test]
    async fn test_agent_reply_updates_conversation() {
        let ctx = create_test_context(FakeProvider::new(ProviderType::Baileys), TenantSettings::default()).await;
        let agent = AiAgent::new(ctx.tenant.id, "Ava", "Be helpful");
        ctx.db.insert_agent(&agent).await.unwrap();

        let inbound = ctx
            .service
            .handle_incoming(&ctx.tenant, incoming("wamid.4", "hello"))
            .await
            .unwrap()
            .unwrap();
        let session = ctx.db.find_session(ctx.tenant.id, SENDER).await.unwrap().unwrap();

        let reply = ctx
            .service
            .reply_with_agent(&ctx.tenant, &session, &inbound)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reply.direction, MessageDirection::Outbound);
        assert_eq!(reply.to_number, "15559990000");
        assert!(reply.content["text"].as_str().unwrap().contains("Ava"));

        let conversation = ctx
            .db
            .get_conversation(agent.id, "15559990000")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(conversation.context.len(), 2);
        assert_eq!(conversation.context[0].role, "user");
        assert_eq!(conversation.context[1].role, "assistant");
    }

    #[tokio::test]
    async fn test_agent_reply_without_agent() {
        let ctx = create_test_context(FakeProvider::new(ProviderType::Baileys), TenantSettings::default()).await;
        let inbound = ctx
            .service
            .handle_incoming(&ctx.tenant, incoming("wamid.5", "hello"))
            .await
            .unwrap()
            .unwrap();
        let session = ctx.db.find_session(ctx.tenant.id, SENDER).await.unwrap().unwrap();

        assert!(ctx
            .service
            .reply_with_agent(&ctx.tenant, &session, &inbound)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_status_updates() {
        let ctx = create_test_context(FakeProvider::new(ProviderType::Baileys), TenantSettings::default()).await;
        let sent = ctx
            .service
            .send_text(&ctx.tenant, SENDER, "15552223333", "Hello")
            .await
            .unwrap();

        let updated = ctx
            .service
            .update_status(&ctx.tenant, &sent.message_id, MessageStatus::Delivered, None)
            .await
            .unwrap();
        assert_eq!(updated.status, MessageStatus::Delivered);

        let read = ctx
            .service
            .apply_remote_status(&sent.message_id, MessageStatus::Read)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read.status, MessageStatus::Read);

        assert!(ctx
            .service
            .apply_remote_status("unknown", MessageStatus::Read)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_same_provider_id_across_tenants() {
        let ctx = create_test_context(FakeProvider::new(ProviderType::Baileys), TenantSettings::default()).await;

        let other = Tenant::new("Globex");
        ctx.db.create_tenant(&other).await.unwrap();
        let other_session = WhatsAppSession::new(other.id, "15552223333", ProviderType::Baileys);
        ctx.db.insert_session(&other_session).await.unwrap();

        let sent = ctx
            .service
            .send_text(&ctx.tenant, SENDER, "15552223333", "Hello")
            .await
            .unwrap();

        // The recipient tenant sees the same WhatsApp key id on its inbound copy
        let received = ctx
            .service
            .handle_incoming(
                &other,
                IncomingMessage {
                    message_id: sent.message_id.clone(),
                    to: "15552223333".to_string(),
                    from: SENDER.to_string(),
                    sender_name: None,
                    message_type: MessageType::Text,
                    text: Some("Hello".to_string()),
                    timestamp: None,
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received.tenant_id, other.id);
        assert_eq!(received.direction, MessageDirection::Inbound);

        let listed = ctx
            .service
            .list_messages(other.id, &MessageQuery::default())
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);

        // Receipts belong to the sender
        let read = ctx
            .service
            .apply_remote_status(&sent.message_id, MessageStatus::Read)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read.tenant_id, ctx.tenant.id);
        assert_eq!(read.direction, MessageDirection::Outbound);
        let inbound = ctx.db.get_message(other.id, &sent.message_id).await.unwrap();
        assert_eq!(inbound.status, MessageStatus::Delivered);
    }

    #[tokio::test]
    async fn test_list_filters_by_phone_and_pages() {
        let ctx = create_test_context(FakeProvider::new(ProviderType::Baileys), TenantSettings::default()).await;
        for i in 0..3 {
            ctx.service
                .send_text(&ctx.tenant, SENDER, "15552223333", &format!("msg {i}"))
                .await
                .unwrap();
        }

        let page = ctx
            .service
            .list_messages(
                ctx.tenant.id,
                &MessageQuery {
                    phone: Some(SENDER.to_string()),
                    limit: Some(2),
                    offset: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(page.len(), 2);

        let other = ctx
            .service
            .list_messages(
                ctx.tenant.id,
                &MessageQuery {
                    phone: Some("19990000000".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(other.is_empty());

        // Another tenant sees nothing
        assert!(ctx
            .service
            .list_messages(Uuid::new_v4(), &MessageQuery::default())
            .await
            .unwrap()
            .is_empty());
    }
}
