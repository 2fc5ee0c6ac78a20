//! Wagate Core - tenant, session and message plumbing
//!
//! This crate holds everything between the HTTP layer and the providers:
//! - Store: SQLite persistence for tenants, sessions, messages and agents
//! - Cache: short-lived session status cache (Redis in production)
//! - Factory: provider registry with cached health flags
//! - Session: per-(tenant, phone) session lifecycle
//! - Message: outbound dispatch and inbound handling
//! - Webhook: signed outbound webhook delivery with retries
//! - Agent: canned AI responder with rolling conversation context

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod agent;
pub mod cache;
pub mod error;
pub mod factory;
pub mod message;
pub mod models;
pub mod retry;
pub mod session;
pub mod store;
pub mod webhook;

pub use agent::{AgentResponder, CannedResponder, MAX_CONTEXT_TURNS};
pub use cache::{
    CacheTtls, MemorySessionCache, NoopSessionCache, RedisSessionCache, SessionCache, StatusCache,
};
pub use error::{Error, Result};
pub use factory::{ProviderFactory, ProviderStats, HEALTH_PROBE_SESSION_ID};
pub use message::{MessageQuery, MessageService, OutgoingContent};
pub use models::{
    AiAgent, AiConversation, ConversationTurn, IncomingMessage, Message, MessageDirection,
    MessageType, SessionData, Tenant, TenantSettings, WhatsAppSession,
};
pub use retry::{retry_with_backoff, RetryError, RetryOutcome, RetryPolicy};
pub use session::SessionService;
pub use store::Database;
pub use webhook::{
    sign_payload, verify_signature, WebhookConfig, WebhookDeliveryResult,
    WebhookDeliveryService, WebhookEnvelope,
};
