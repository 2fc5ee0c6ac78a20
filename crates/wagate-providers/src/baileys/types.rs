use serde::{Deserialize, Serialize};

/// Initialize request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InitializeRequest<'a> {
    pub session_id: &'a str,
    pub phone_number: &'a str,
    pub tenant_id: &'a str,
}

/// Initialize / status response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Whether the bridge accepted the call
    #[serde(default = "default_true")]
    pub success: bool,
    /// Session id echoed back by the bridge
    pub session_id: Option<String>,
    /// Bridge connection state (e.g. "connected", "qr_ready", "close")
    #[serde(default)]
    pub status: Option<String>,
    /// QR code data for pairing (if waiting for scan)
    pub qr_code: Option<String>,
    /// Phone number the socket is logged in as
    pub phone_number: Option<String>,
    /// Error description
    pub error: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Send message response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    /// Whether the message was sent successfully.
    pub success: bool,
    /// WhatsApp message ID if sent.
    pub message_id: Option<String>,
    /// Error description if sending failed.
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SendTextRequest<'a> {
    pub session_id: &'a str,
    pub to: &'a str,
    pub message: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SendMediaRequest<'a> {
    pub session_id: &'a str,
    pub to: &'a str,
    pub media_url: &'a str,
    pub media_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SendLocationRequest<'a> {
    pub session_id: &'a str,
    pub to: &'a str,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SendAudioRequest<'a> {
    pub session_id: &'a str,
    pub to: &'a str,
    pub audio_url: &'a str,
    pub ptt: bool,
}

/// Event posted by the bridge to our inbound webhook
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeEvent {
    /// Event name: `message`, `message.status` or `connection.update`
    pub event: String,
    /// Session the event belongs to
    pub session_id: String,
    /// Event payload
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Incoming message carried by a `message` bridge event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeIncomingMessage {
    /// Message ID
    pub id: String,
    /// Sender JID (phone@s.whatsapp.net)
    pub from: String,
    /// Message kind (text, image, location, audio, ...)
    #[serde(default = "default_text_type", rename = "type")]
    pub message_type: String,
    /// Text body or caption
    #[serde(default)]
    pub text: Option<String>,
    /// Unix timestamp
    #[serde(default)]
    pub timestamp: Option<i64>,
    /// Push name of the sender
    #[serde(default)]
    pub push_name: Option<String>,
    /// Is group message
    #[serde(default)]
    pub is_group: bool,
}

fn default_text_type() -> String {
    "text".to_string()
}

/// Delivery receipt carried by a `message.status` bridge event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeStatusUpdate {
    /// Message ID the receipt refers to
    pub message_id: String,
    /// New status string
    pub status: String,
}

/// Connection change carried by a `connection.update` bridge event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConnectionUpdate {
    /// New connection state
    pub status: String,
    /// Fresh QR code, if any
    #[serde(default)]
    pub qr_code: Option<String>,
}
