//! Provider contract shared by every WhatsApp backend

use crate::error::Result;
use crate::types::{
    AudioMessage, LocationMessage, MediaMessage, MessageResult, ProviderType, SessionStatus,
};
use std::sync::Arc;

/// Uniform contract over a WhatsApp backend.
///
/// Send operations never return an error: transport and remote failures are
/// folded into a [`MessageResult`] with status `failed`.
#[async_trait::async_trait]
pub trait WhatsAppProvider: Send + Sync {
    /// Which backend this is
    fn provider_type(&self) -> ProviderType;

    /// Start (or resume) a session for a tenant's phone number
    async fn initialize(&self, tenant_id: &str, phone_number: &str) -> Result<SessionStatus>;

    /// Send a text message
    async fn send_text(&self, session_id: &str, to: &str, text: &str) -> MessageResult;

    /// Send an image, video or document
    async fn send_media(&self, session_id: &str, message: &MediaMessage) -> MessageResult;

    /// Send a location pin
    async fn send_location(&self, session_id: &str, message: &LocationMessage) -> MessageResult;

    /// Send an audio file or voice note
    async fn send_audio(&self, session_id: &str, message: &AudioMessage) -> MessageResult;

    /// Query the live status of a session
    async fn get_status(&self, session_id: &str) -> Result<SessionStatus>;

    /// Tear the session down on the provider side
    async fn disconnect(&self, session_id: &str) -> Result<()>;
}

/// Shared, dynamically dispatched provider handle
pub type SharedProvider = Arc<dyn WhatsAppProvider>;
