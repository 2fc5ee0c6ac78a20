//! Error types for wagate-providers

use thiserror::Error;

/// Provider error type
#[derive(Debug, Error)]
pub enum Error {
    /// Baileys bridge unreachable or returned garbage
    #[error("bridge error: {0}")]
    Bridge(String),

    /// Remote WhatsApp side rejected the request
    #[error("whatsapp error: {0}")]
    WhatsApp(String),

    /// Meta Cloud API error
    #[error("meta api error: {0}")]
    MetaApi(String),

    /// Provider is missing credentials or configuration
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// Unknown provider type string
    #[error("unknown provider type: {0}")]
    UnknownProvider(String),

    /// Malformed input (session key, phone number, payload)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Network error
    #[error("network error: {0}")]
    Network(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
