//! Domain models
//!
//! These are the in-memory shapes of the persisted rows. JSON columns
//! (`settings`, `session_data`, `content`, `context`) are typed here and
//! serialized by the store.

use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use uuid::Uuid;
use wagate_providers::{MessageStatus, ProviderType, SessionState, SessionStatus};

/// An isolated customer account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    /// Tenant ID
    pub id: Uuid,
    /// Public identifier sent in the `X-Client-Id` header
    pub client_id: String,
    /// Display name
    pub name: String,
    /// Tenant settings
    pub settings: TenantSettings,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Create a tenant with a freshly generated client id
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            client_id: format!("wag_{}", Uuid::new_v4().simple()),
            name: name.into(),
            settings: TenantSettings::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Per-tenant settings, stored as JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TenantSettings {
    /// Where outbound webhooks are posted
    pub webhook_url: Option<String>,
    /// HMAC secret for webhook signatures
    pub webhook_secret: Option<String>,
    /// Event names to deliver (empty = all)
    pub webhook_events: Vec<String>,
    /// Provider to use for new sessions when healthy
    pub preferred_provider: Option<ProviderType>,
    /// Route inbound messages to the AI agent
    pub ai_enabled: bool,
}

impl TenantSettings {
    /// Whether an event should be delivered to this tenant's webhook
    #[must_use]
    pub fn wants_event(&self, event: &str) -> bool {
        self.webhook_url.as_deref().is_some_and(|url| !url.is_empty())
            && (self.webhook_events.is_empty() || self.webhook_events.iter().any(|e| e == event))
    }
}

/// Provider-side metadata of a session, stored as JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionData {
    /// Provider session id
    pub session_id: Option<String>,
    /// Last QR code seen
    pub qr_code: Option<String>,
    /// Last known state
    pub status: Option<SessionState>,
    /// When `status` was last written
    pub last_status_at: Option<DateTime<Utc>>,
}

/// A (tenant, phone number) pairing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppSession {
    /// Row ID
    pub id: Uuid,
    /// Owning tenant
    pub tenant_id: Uuid,
    /// Normalized phone number
    pub phone_number: String,
    /// Provider serving this session
    pub provider_type: ProviderType,
    /// Provider metadata
    pub session_data: SessionData,
    /// Whether the session may send
    pub is_active: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl WhatsAppSession {
    /// New active session row with empty metadata
    #[must_use]
    pub fn new(tenant_id: Uuid, phone_number: impl Into<String>, provider_type: ProviderType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            phone_number: phone_number.into(),
            provider_type,
            session_data: SessionData::default(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a provider status snapshot into the metadata
    pub fn apply_status(&mut self, status: &SessionStatus) {
        if let Some(session_id) = &status.session_id {
            self.session_data.session_id = Some(session_id.clone());
        }
        if status.qr_code.is_some() || status.state == SessionState::Connected {
            self.session_data.qr_code = status.qr_code.clone();
        }
        self.session_data.status = Some(status.state);
        self.session_data.last_status_at = Some(status.updated_at);
        self.is_active = !matches!(
            status.state,
            SessionState::Disconnected | SessionState::Failed
        );
    }

    /// Status snapshot derived from the stored metadata
    #[must_use]
    pub fn to_status(&self) -> SessionStatus {
        let mut status = SessionStatus::new(
            &self.phone_number,
            self.session_data.status.unwrap_or(SessionState::Initializing),
        )
        .with_qr_code(self.session_data.qr_code.clone())
        .with_provider(self.provider_type);

        if let Some(session_id) = &self.session_data.session_id {
            status = status.with_session_id(session_id);
        }
        status.updated_at = self.session_data.last_status_at.unwrap_or(self.updated_at);
        status
    }
}

/// Message direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageDirection {
    /// Received from WhatsApp
    Inbound,
    /// Sent by a tenant
    Outbound,
}

impl MessageDirection {
    /// Get the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }
}

impl FromStr for MessageDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inbound" => Ok(Self::Inbound),
            "outbound" => Ok(Self::Outbound),
            other => Err(Error::Internal(format!("unknown direction: {other}"))),
        }
    }
}

/// Message kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Plain text
    Text,
    /// Image, video or document
    Media,
    /// Location pin
    Location,
    /// Audio file or voice note
    Audio,
}

impl MessageType {
    /// Get the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Media => "media",
            Self::Location => "location",
            Self::Audio => "audio",
        }
    }

    /// Classify a provider message type string
    #[must_use]
    pub fn from_remote(kind: &str) -> Self {
        match kind.to_lowercase().as_str() {
            "location" | "livelocation" => Self::Location,
            "audio" | "ptt" | "voice" => Self::Audio,
            "image" | "video" | "document" | "sticker" | "media" => Self::Media,
            _ => Self::Text,
        }
    }
}

impl FromStr for MessageType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "media" => Ok(Self::Media),
            "location" => Ok(Self::Location),
            "audio" => Ok(Self::Audio),
            other => Err(Error::Internal(format!("unknown message type: {other}"))),
        }
    }
}

/// A persisted message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Row ID
    pub id: Uuid,
    /// Owning tenant
    pub tenant_id: Uuid,
    /// Session the message went through
    pub session_id: Uuid,
    /// Provider message id (unique)
    pub message_id: String,
    /// Direction
    pub direction: MessageDirection,
    /// Sender number
    pub from_number: String,
    /// Recipient number
    pub to_number: String,
    /// Kind
    pub message_type: MessageType,
    /// Payload (text body, media URL, coordinates...)
    pub content: Value,
    /// Delivery status
    pub status: MessageStatus,
    /// Failure description
    pub error: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

/// Inbound message handed over by a provider webhook
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingMessage {
    /// Provider message id
    pub message_id: String,
    /// Tenant phone number the message arrived on
    pub to: String,
    /// Sender number
    pub from: String,
    /// Sender display name
    pub sender_name: Option<String>,
    /// Kind
    pub message_type: MessageType,
    /// Text body or caption
    pub text: Option<String>,
    /// When WhatsApp received it
    pub timestamp: Option<DateTime<Utc>>,
}

/// AI agent configured by a tenant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAgent {
    /// Agent ID
    pub id: Uuid,
    /// Owning tenant
    pub tenant_id: Uuid,
    /// Display name
    pub name: String,
    /// Instructions for the agent
    pub system_prompt: String,
    /// Whether the agent answers messages
    pub is_active: bool,
    /// Free-form configuration
    pub configuration: Value,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl AiAgent {
    /// New active agent
    #[must_use]
    pub fn new(tenant_id: Uuid, name: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            name: name.into(),
            system_prompt: system_prompt.into(),
            is_active: true,
            configuration: Value::Object(Default::default()),
            created_at: now,
            updated_at: now,
        }
    }
}

/// One exchange in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// `user` or `assistant`
    pub role: String,
    /// Turn text
    pub content: String,
    /// When the turn happened
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    /// Turn from the WhatsApp contact
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Turn from the agent
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Conversation between an agent and one phone number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiConversation {
    /// Row ID
    pub id: Uuid,
    /// Owning tenant
    pub tenant_id: Uuid,
    /// Agent in the conversation
    pub agent_id: Uuid,
    /// Contact phone number
    pub phone_number: String,
    /// Most recent turns, oldest first
    pub context: Vec<ConversationTurn>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl AiConversation {
    /// Empty conversation
    #[must_use]
    pub fn new(tenant_id: Uuid, agent_id: Uuid, phone_number: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            agent_id,
            phone_number: phone_number.into(),
            context: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a turn, keeping at most `max_turns` of the newest
    pub fn push_turn(&mut self, turn: ConversationTurn, max_turns: usize) {
        self.context.push(turn);
        if self.context.len() > max_turns {
            let excess = self.context.len() - max_turns;
            self.context.drain(..excess);
        }
        self.updated_at = Utc::now();
    }
}
