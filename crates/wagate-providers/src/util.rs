//! Shared helpers for provider clients

/// Maximum length of text to log
pub const MAX_LOG_TEXT_LENGTH: usize = 50;

/// WhatsApp message character limit (recommended split size)
pub const WHATSAPP_MESSAGE_LIMIT: usize = 4096;

/// Patterns that indicate potentially sensitive content
pub const SENSITIVE_PATTERNS: &[&str] = &[
    "password",
    "passwd",
    "secret",
    "token",
    "api_key",
    "apikey",
    "bearer",
    "authorization",
    "credential",
    "private",
    "otp",
];

/// Mask potentially sensitive text for logging
///
/// # Examples
/// ```
/// use wagate_providers::util::mask_for_logging;
///
/// assert!(mask_for_logging("my password is hunter2").contains("REDACTED"));
/// assert_eq!(mask_for_logging("Hello"), "Hello");
/// ```
#[must_use]
pub fn mask_for_logging(text: &str) -> String {
    let lower = text.to_lowercase();

    for pattern in SENSITIVE_PATTERNS {
        if lower.contains(pattern) {
            return "[REDACTED]".to_string();
        }
    }

    if text.chars().count() > MAX_LOG_TEXT_LENGTH {
        let head: String = text.chars().take(MAX_LOG_TEXT_LENGTH).collect();
        format!("{head}...[truncated]")
    } else {
        text.to_string()
    }
}

/// Split text into chunks of at most `limit` characters
#[must_use]
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    if limit == 0 || text.chars().count() <= limit {
        return vec![text.to_string()];
    }

    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(limit)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
