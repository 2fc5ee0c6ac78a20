use serde::Deserialize;

/// Graph API host
pub const DEFAULT_GRAPH_URL: &str = "https://graph.facebook.com";

/// Meta Cloud API configuration
///
/// Credentials are optional; without them the provider stays registered but
/// reports itself as not configured.
#[derive(Debug, Clone, Deserialize)]
pub struct MetaApiConfig {
    /// Access token (from Meta Business Suite)
    #[serde(default)]
    pub access_token: Option<String>,
    /// Phone Number ID of the business number
    #[serde(default)]
    pub phone_number_id: Option<String>,
    /// API version (default: v18.0)
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Webhook verify token (for webhook verification)
    #[serde(default = "default_verify_token")]
    pub verify_token: String,
    /// Graph API host, overridable for tests
    #[serde(default = "default_graph_url")]
    pub graph_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_api_version() -> String {
    "v18.0".to_string()
}

fn default_verify_token() -> String {
    "wagate_webhook_verify".to_string()
}

fn default_graph_url() -> String {
    DEFAULT_GRAPH_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for MetaApiConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            phone_number_id: None,
            api_version: default_api_version(),
            verify_token: default_verify_token(),
            graph_url: default_graph_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl MetaApiConfig {
    /// Create with credentials
    #[must_use]
    pub fn new(access_token: impl Into<String>, phone_number_id: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            phone_number_id: Some(phone_number_id.into()),
            ..Default::default()
        }
    }

    /// Set webhook verify token
    #[must_use]
    pub fn with_verify_token(mut self, token: impl Into<String>) -> Self {
        self.verify_token = token.into();
        self
    }

    /// Point at a different Graph API host
    #[must_use]
    pub fn with_graph_url(mut self, url: impl Into<String>) -> Self {
        self.graph_url = url.into();
        self
    }

    /// Whether both credentials are present and non-empty
    #[must_use]
    pub fn is_configured(&self) -> bool {
        matches!(
            (&self.access_token, &self.phone_number_id),
            (Some(token), Some(id)) if !token.is_empty() && !id.is_empty()
        )
    }

    /// Get API URL for messages endpoint
    pub(crate) fn messages_url(&self, phone_number_id: &str) -> String {
        format!(
            "{}/{}/{}/messages",
            self.graph_url.trim_end_matches('/'),
            self.api_version,
            phone_number_id
        )
    }
}
