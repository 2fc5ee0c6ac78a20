//! Outbound webhook delivery
//!
//! Events are wrapped in a `{event, timestamp, data}` envelope and POSTed to
//! the tenant's webhook URL. When the tenant has a secret, the exact body
//! bytes are signed with HMAC-SHA256 and sent as
//! `X-Webhook-Signature: sha256=<hex>`.
//!
//! Delivery never fails across the API boundary: every outcome is reported
//! in a [`WebhookDeliveryResult`].

use crate::models::Tenant;
use crate::retry::{retry_with_backoff, RetryPolicy};
use chrono::{DateTime, SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{info, warn};

type HmacSha256 = Hmac<Sha256>;

/// Signature header name
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// Event name header
pub const EVENT_HEADER: &str = "X-Webhook-Event";

/// Delivery settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Per-attempt timeout in seconds
    pub timeout_secs: u64,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds
    pub base_delay_ms: u64,
    /// Cap for any single delay in seconds
    pub max_delay_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_secs: 60,
        }
    }
}

impl WebhookConfig {
    /// Backoff schedule for these settings
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries)
            .with_base_delay(Duration::from_millis(self.base_delay_ms))
            .with_max_delay(Duration::from_secs(self.max_delay_secs))
    }
}

/// Body posted to a webhook receiver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    /// Event name, e.g. `message.received`
    pub event: String,
    /// RFC 3339 time the event was produced
    pub timestamp: String,
    /// Event payload
    pub data: Value,
}

impl WebhookEnvelope {
    /// Wrap a payload, stamped with the given time
    #[must_use]
    pub fn new(event: impl Into<String>, data: Value, at: DateTime<Utc>) -> Self {
        Self {
            event: event.into(),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            data,
        }
    }
}

/// Outcome of a delivery, after all retries
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookDeliveryResult {
    /// Whether a 2xx came back
    pub success: bool,
    /// HTTP attempts made
    pub attempts: u32,
    /// Wall time across all attempts
    pub duration_ms: u64,
    /// Status code of the last response, if any
    pub last_status_code: Option<u16>,
    /// Last failure description
    pub last_error: Option<String>,
}

/// `sha256=<hex>` HMAC-SHA256 signature of a body
///
/// # Examples
/// ```
/// use wagate_core::webhook::{sign_payload, verify_signature};
///
/// let sig = sign_payload("secret", b"{}");
/// assert!(sig.starts_with("sha256="));
/// assert!(verify_signature("secret", b"{}", &sig));
/// ```
#[must_use]
pub fn sign_payload(secret: &str, body: &[u8]) -> String {
    // HMAC accepts keys of any length
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

/// Check a `sha256=<hex>` signature in constant time
#[must_use]
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Some(expected) = signature
        .strip_prefix("sha256=")
        .and_then(|hex_sig| hex::decode(hex_sig).ok())
    else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[derive(Debug)]
struct AttemptFailure {
    status_code: Option<u16>,
    message: String,
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Signed webhook sender with retries
pub struct WebhookDeliveryService {
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl WebhookDeliveryService {
    /// Create a delivery service
    pub fn new(config: &WebhookConfig) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| crate::Error::Internal(format!("Failed to create webhook HTTP client: {e}")))?;

        Ok(Self {
            client,
            policy: config.retry_policy(),
        })
    }

    async fn send_once(
        &self,
        url: &str,
        event: &str,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<u16, AttemptFailure> {
        let mut request = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(EVENT_HEADER, event)
            .body(body.to_vec());

        if let Some(signature) = signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }

        match request.send().await {
            Ok(resp) if resp.status().is_success() => Ok(resp.status().as_u16()),
            Ok(resp) => Err(AttemptFailure {
                status_code: Some(resp.status().as_u16()),
                message: format!("HTTP {}", resp.status().as_u16()),
            }),
            Err(e) => Err(AttemptFailure {
                status_code: None,
                message: e.to_string(),
            }),
        }
    }

    /// Deliver one event, retrying on non-2xx and transport errors
    pub async fn deliver(
        &self,
        url: &str,
        secret: Option<&str>,
        event: &str,
        data: Value,
    ) -> WebhookDeliveryResult {
        let started = Instant::now();
        let envelope = WebhookEnvelope::new(event, data, Utc::now());

        let body = match serde_json::to_vec(&envelope) {
            Ok(body) => body,
            Err(e) => {
                return WebhookDeliveryResult {
                    success: false,
                    attempts: 0,
                    duration_ms: 0,
                    last_status_code: None,
                    last_error: Some(format!("Failed to encode payload: {e}")),
                }
            }
        };

        let signature = secret
            .filter(|s| !s.is_empty())
            .map(|s| sign_payload(s, &body));

        let outcome = retry_with_backoff(
            &self.policy,
            |_| self.send_once(url, event, &body, signature.as_deref()),
            |_| true,
        )
        .await;

        let duration_ms = started.elapsed().as_millis() as u64;
        match outcome {
            Ok(done) => {
                info!(url, event, attempts = done.attempts, "Webhook delivered");
                WebhookDeliveryResult {
                    success: true,
                    attempts: done.attempts,
                    duration_ms,
                    last_status_code: Some(done.value),
                    last_error: None,
                }
            }
            Err(failed) => {
                warn!(url, event, attempts = failed.attempts, error = %failed.last_error, "Webhook delivery failed");
                WebhookDeliveryResult {
                    success: false,
                    attempts: failed.attempts,
                    duration_ms,
                    last_status_code: failed.last_error.status_code,
                    last_error: Some(failed.last_error.message),
                }
            }
        }
    }

    /// Deliver in the background; the result is only logged
    pub fn spawn_delivery(
        self: &Arc<Self>,
        url: String,
        secret: Option<String>,
        event: String,
        data: Value,
    ) -> JoinHandle<WebhookDeliveryResult> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            service
                .deliver(&url, secret.as_deref(), &event, data)
                .await
        })
    }

    /// Fire-and-forget delivery of an event to a tenant, if it subscribed
    pub fn notify(
        self: &Arc<Self>,
        tenant: &Tenant,
        event: &str,
        data: Value,
    ) -> Option<JoinHandle<WebhookDeliveryResult>> {
        if !tenant.settings.wants_event(event) {
            return None;
        }
        let url = tenant.settings.webhook_url.clone()?;

        Some(self.spawn_delivery(
            url,
            tenant.settings.webhook_secret.clone(),
            event.to_string(),
            data,
        ))
    }
}
