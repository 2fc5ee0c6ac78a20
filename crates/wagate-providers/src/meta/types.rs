use serde::{Deserialize, Serialize};

/// Graph API send response
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    /// Accepted messages
    #[serde(default)]
    pub messages: Option<Vec<MessageInfo>>,
    /// Error object when the call was rejected
    #[serde(default)]
    pub error: Option<ApiError>,
}

/// Accepted message reference
#[derive(Debug, Deserialize)]
pub struct MessageInfo {
    /// WhatsApp message id (`wamid.*`)
    pub id: String,
}

/// Graph API error object
#[derive(Debug, Deserialize)]
pub struct ApiError {
    /// Error message
    pub message: String,
    /// Error code
    #[serde(default)]
    pub code: i32,
}

/// Incoming webhook event from the Cloud API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaWebhook {
    /// Object type (should be "whatsapp_business_account")
    pub object: String,
    /// Entry array
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

/// Webhook entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEntry {
    /// Business Account ID
    pub id: String,
    /// Changes array
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

/// Webhook change event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookChange {
    /// Value containing the actual message data
    pub value: WebhookValue,
    /// Field name
    pub field: String,
}

/// Webhook value containing message data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookValue {
    /// Messaging product
    pub messaging_product: String,
    /// Metadata
    pub metadata: WebhookMetadata,
    /// Contacts (sender info)
    #[serde(default)]
    pub contacts: Vec<WebhookContact>,
    /// Messages
    #[serde(default)]
    pub messages: Vec<WebhookMessage>,
    /// Statuses (delivery receipts)
    #[serde(default)]
    pub statuses: Vec<WebhookStatus>,
}

/// Webhook metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookMetadata {
    /// Display phone number of the business number
    pub display_phone_number: String,
    /// Phone number ID
    pub phone_number_id: String,
}

/// Webhook contact (sender info)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookContact {
    /// Profile info
    pub profile: Option<WebhookProfile>,
    /// Phone number
    pub wa_id: String,
}

/// Webhook profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookProfile {
    /// Display name
    pub name: String,
}

/// Webhook message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookMessage {
    /// Sender phone number
    pub from: String,
    /// Message ID
    pub id: String,
    /// Unix timestamp as a string
    pub timestamp: String,
    /// Message type
    #[serde(rename = "type")]
    pub message_type: String,
    /// Text content (for text messages)
    pub text: Option<TextContent>,
}

/// Text content in message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    /// Message body
    pub body: String,
}

/// Webhook status (delivery receipts)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookStatus {
    /// Message ID
    pub id: String,
    /// Status (sent, delivered, read, failed)
    pub status: String,
    /// Timestamp
    pub timestamp: String,
    /// Recipient ID
    pub recipient_id: String,
}

/// Inbound text message pulled out of a webhook payload
#[derive(Debug, Clone, PartialEq)]
pub struct MetaInboundMessage {
    /// Business number the message was sent to (normalized)
    pub business_phone: String,
    /// Sender number
    pub from: String,
    /// Sender display name, if the contact block carried one
    pub sender_name: Option<String>,
    /// WhatsApp message id
    pub message_id: String,
    /// Message body
    pub text: String,
    /// Unix timestamp
    pub timestamp: Option<i64>,
}

/// Delivery receipt pulled out of a webhook payload
#[derive(Debug, Clone, PartialEq)]
pub struct MetaStatusUpdate {
    /// Business number the receipt belongs to (normalized)
    pub business_phone: String,
    /// WhatsApp message id
    pub message_id: String,
    /// Raw status string
    pub status: String,
}
