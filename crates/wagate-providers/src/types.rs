//! Provider-neutral types
//!
//! These types abstract the differences between the Baileys bridge and the
//! Meta Cloud API so that callers only ever see one vocabulary.

use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Provider type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    /// Self-hosted WhatsApp Web client behind the Node.js bridge
    Baileys,
    /// Meta Business Cloud API
    MetaApi,
}

impl ProviderType {
    /// Every provider type, in registration order
    pub const ALL: [ProviderType; 2] = [ProviderType::Baileys, ProviderType::MetaApi];

    /// Get the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Baileys => "baileys",
            Self::MetaApi => "meta_api",
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "baileys" => Ok(Self::Baileys),
            "meta" | "meta_api" | "metaapi" | "meta-api" => Ok(Self::MetaApi),
            other => Err(Error::UnknownProvider(other.to_string())),
        }
    }
}

/// Lifecycle state of a WhatsApp session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No session row exists
    NotFound,
    /// Bridge is starting the socket
    Initializing,
    /// Waiting for the QR code to be scanned
    QrReady,
    /// Logged in and ready to send
    Connected,
    /// Logged out or socket closed
    Disconnected,
    /// Initialization failed
    Failed,
    /// Remote reported an error
    Error,
    /// Provider itself is broken; the only state that marks a provider unhealthy
    CriticalError,
}

impl SessionState {
    /// Get the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Initializing => "initializing",
            Self::QrReady => "qr_ready",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Failed => "failed",
            Self::Error => "error",
            Self::CriticalError => "critical_error",
        }
    }

    /// Map a status string reported by a remote service.
    ///
    /// Accepts both our own vocabulary and the raw Baileys connection states.
    #[must_use]
    pub fn from_remote(status: &str) -> Self {
        match status.trim().to_lowercase().as_str() {
            "connected" | "open" | "ready" => Self::Connected,
            "qr_ready" | "qr" | "waiting_scan" | "qrcode" => Self::QrReady,
            "initializing" | "connecting" | "starting" => Self::Initializing,
            "disconnected" | "close" | "closed" | "logged_out" => Self::Disconnected,
            "not_found" => Self::NotFound,
            "failed" => Self::Failed,
            "critical_error" => Self::CriticalError,
            _ => Self::Error,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of a session as seen by a provider or the session store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    /// Provider-side session id (`session-{tenant}-{phone}` for Baileys)
    pub session_id: Option<String>,
    /// Normalized phone number
    pub phone_number: String,
    /// Current state
    #[serde(rename = "status")]
    pub state: SessionState,
    /// QR code payload while waiting for a scan
    pub qr_code: Option<String>,
    /// Provider owning the session
    pub provider_type: Option<ProviderType>,
    /// Human-readable detail (usually an error)
    pub message: Option<String>,
    /// When this snapshot was taken
    pub updated_at: DateTime<Utc>,
}

impl SessionStatus {
    /// Create a new status snapshot
    #[must_use]
    pub fn new(phone_number: impl Into<String>, state: SessionState) -> Self {
        Self {
            session_id: None,
            phone_number: phone_number.into(),
            state,
            qr_code: None,
            provider_type: None,
            message: None,
            updated_at: Utc::now(),
        }
    }

    /// Status for a (tenant, phone) with no session row
    #[must_use]
    pub fn not_found(phone_number: impl Into<String>) -> Self {
        Self::new(phone_number, SessionState::NotFound)
    }

    /// Set the provider session id
    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Set the QR code
    #[must_use]
    pub fn with_qr_code(mut self, qr_code: Option<String>) -> Self {
        self.qr_code = qr_code;
        self
    }

    /// Set the provider type
    #[must_use]
    pub fn with_provider(mut self, provider_type: ProviderType) -> Self {
        self.provider_type = Some(provider_type);
        self
    }

    /// Set the detail message
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Whether the session can send messages
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }
}

/// Delivery status of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// Accepted locally, not yet handed to WhatsApp
    Pending,
    /// Handed to WhatsApp
    Sent,
    /// Delivered to the recipient device
    Delivered,
    /// Read by the recipient
    Read,
    /// Could not be sent
    Failed,
}

impl MessageStatus {
    /// Get the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MessageStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "sent" | "server_ack" => Ok(Self::Sent),
            "delivered" | "delivery_ack" => Ok(Self::Delivered),
            "read" | "played" => Ok(Self::Read),
            "failed" | "error" => Ok(Self::Failed),
            other => Err(Error::InvalidInput(format!("unknown message status: {other}"))),
        }
    }
}

/// Outcome of a send operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResult {
    /// Provider-assigned message id
    pub message_id: Option<String>,
    /// Resulting status
    pub status: MessageStatus,
    /// Error description when `status` is `Failed`
    pub error: Option<String>,
    /// When the result was produced
    pub timestamp: DateTime<Utc>,
}

impl MessageResult {
    /// Successful send
    #[must_use]
    pub fn sent(message_id: impl Into<String>) -> Self {
        Self {
            message_id: Some(message_id.into()),
            status: MessageStatus::Sent,
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Failed send
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            message_id: None,
            status: MessageStatus::Failed,
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }

    /// Whether the message left the building
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status != MessageStatus::Failed
    }
}

/// Media kind for media messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Image file
    Image,
    /// Video file
    Video,
    /// Audio file
    Audio,
    /// Any other document
    Document,
}

impl MediaType {
    /// Classify a MIME type
    #[must_use]
    pub fn from_mime(mime_type: &str) -> Self {
        match mime_type.split('/').next().unwrap_or("document") {
            "image" => Self::Image,
            "video" => Self::Video,
            "audio" => Self::Audio,
            _ => Self::Document,
        }
    }

    /// Get the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Document => "document",
        }
    }
}

/// Outgoing media message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMessage {
    /// Recipient phone number
    pub to: String,
    /// Publicly reachable media URL
    pub media_url: String,
    /// Media kind
    pub media_type: MediaType,
    /// Optional caption
    #[serde(default)]
    pub caption: Option<String>,
    /// Optional file name (documents)
    #[serde(default)]
    pub file_name: Option<String>,
}

/// Outgoing location message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationMessage {
    /// Recipient phone number
    pub to: String,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Place name
    #[serde(default)]
    pub name: Option<String>,
    /// Street address
    #[serde(default)]
    pub address: Option<String>,
}

/// Outgoing audio message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioMessage {
    /// Recipient phone number
    pub to: String,
    /// Publicly reachable audio URL
    pub audio_url: String,
    /// Send as push-to-talk voice note
    #[serde(default)]
    pub ptt: bool,
}
