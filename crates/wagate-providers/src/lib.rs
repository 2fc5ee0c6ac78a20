//! Wagate Providers - WhatsApp backend integrations
//!
//! This crate provides the provider clients that actually talk to WhatsApp:
//! - Baileys (self-hosted WhatsApp Web client behind an HTTP bridge)
//! - Meta Business Cloud API
//!
//! Both implement the [`WhatsAppProvider`] contract so that the session and
//! message services can stay provider-agnostic.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod baileys;
pub mod error;
pub mod meta;
pub mod phone;
pub mod provider;
pub mod types;
pub mod util;

pub use error::{Error, Result};

pub use provider::{SharedProvider, WhatsAppProvider};
pub use types::{
    AudioMessage, LocationMessage, MediaMessage, MediaType, MessageResult, MessageStatus,
    ProviderType, SessionState, SessionStatus,
};

// Re-export provider clients
pub use baileys::{BaileysConfig, BaileysProvider};
pub use meta::{MetaApiConfig, MetaApiProvider, MetaWebhook};
