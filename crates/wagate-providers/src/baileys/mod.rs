//! Baileys - self-hosted WhatsApp Web bridge
//!
//! Thin HTTP client over a separately deployed Node.js service that speaks the
//! WhatsApp Web protocol. Session ids are derived deterministically as
//! `session-{tenantId}-{phone}`.
//!
//! # Warning
//!
//! Baileys is an **unofficial** reverse-engineered WhatsApp Web library.
//! Numbers used with it can be banned by WhatsApp.

/// Bridge connection configuration.
pub mod config;
/// Provider implementation.
pub mod provider;
/// Bridge API request/response and event types.
pub mod types;

pub use config::BaileysConfig;
pub use provider::BaileysProvider;
pub use types::*;
