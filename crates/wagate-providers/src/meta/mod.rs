//! Meta Business Cloud API provider

/// Cloud API credentials and endpoint configuration.
pub mod config;
/// Provider implementation and webhook helpers.
pub mod provider;
/// Graph API request/response and webhook types.
pub mod types;

pub use config::MetaApiConfig;
pub use provider::MetaApiProvider;
pub use types::*;
