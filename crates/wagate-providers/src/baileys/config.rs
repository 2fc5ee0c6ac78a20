use serde::Deserialize;
use std::time::Duration;

/// Default Baileys bridge server URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of status polls while waiting for a QR code
pub const DEFAULT_QR_POLL_ATTEMPTS: u32 = 3;

/// Default delay between QR polls in milliseconds
pub const DEFAULT_QR_POLL_INTERVAL_MS: u64 = 500;

/// Baileys bridge configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BaileysConfig {
    /// Bridge server URL (default: http://localhost:3001)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Status polls after initialize when no QR came back
    #[serde(default = "default_qr_poll_attempts")]
    pub qr_poll_attempts: u32,
    /// Delay between QR polls
    #[serde(default = "default_qr_poll_interval")]
    pub qr_poll_interval_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_qr_poll_attempts() -> u32 {
    DEFAULT_QR_POLL_ATTEMPTS
}

fn default_qr_poll_interval() -> u64 {
    DEFAULT_QR_POLL_INTERVAL_MS
}

impl Default for BaileysConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            qr_poll_attempts: default_qr_poll_attempts(),
            qr_poll_interval_ms: default_qr_poll_interval(),
        }
    }
}

impl BaileysConfig {
    /// Create with bridge URL
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the QR polling schedule
    #[must_use]
    pub fn with_qr_polling(mut self, attempts: u32, interval_ms: u64) -> Self {
        self.qr_poll_attempts = attempts;
        self.qr_poll_interval_ms = interval_ms;
        self
    }

    pub(crate) fn qr_poll_interval(&self) -> Duration {
        Duration::from_millis(self.qr_poll_interval_ms)
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
