//! Phone number handling
//!
//! Numbers are normalized by stripping `+` and whitespace. There is no E.164
//! validation; whatever digits the caller sends are kept.

use crate::error::{Error, Result};

/// JID suffixes used by WhatsApp Web
const JID_SUFFIXES: &[&str] = &["@s.whatsapp.net", "@c.us", "@g.us"];

/// Prefix of provider session ids
const SESSION_KEY_PREFIX: &str = "session-";

/// Length of a hyphenated UUID
const UUID_LEN: usize = 36;

/// Strip `+` and whitespace from a phone number
#[must_use]
pub fn normalize(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| *c != '+' && !c.is_whitespace())
        .collect()
}

/// Extract a normalized phone number from a WhatsApp JID
///
/// # Examples
/// ```
/// use wagate_providers::phone::from_jid;
///
/// assert_eq!(from_jid("15551234567@s.whatsapp.net"), "15551234567");
/// assert_eq!(from_jid("15551234567:12@s.whatsapp.net"), "15551234567");
/// ```
#[must_use]
pub fn from_jid(jid: &str) -> String {
    let mut bare = jid;
    for suffix in JID_SUFFIXES {
        if let Some(stripped) = bare.strip_suffix(suffix) {
            bare = stripped;
            break;
        }
    }
    // Multi-device JIDs carry a ":device" suffix
    let bare = bare.split(':').next().unwrap_or(bare);
    normalize(bare)
}

/// Deterministic provider session id for a (tenant, phone) pair
#[must_use]
pub fn session_key(tenant_id: &str, phone: &str) -> String {
    format!("{}{}-{}", SESSION_KEY_PREFIX, tenant_id, normalize(phone))
}

/// Split a session id back into (tenant_id, phone)
pub fn parse_session_key(key: &str) -> Result<(String, String)> {
    let rest = key
        .strip_prefix(SESSION_KEY_PREFIX)
        .ok_or_else(|| Error::InvalidInput(format!("not a session key: {key}")))?;

    if rest.len() <= UUID_LEN + 1 || !rest.is_char_boundary(UUID_LEN) {
        return Err(Error::InvalidInput(format!("malformed session key: {key}")));
    }

    let (tenant_id, tail) = rest.split_at(UUID_LEN);
    let phone = tail
        .strip_prefix('-')
        .ok_or_else(|| Error::InvalidInput(format!("malformed session key: {key}")))?;

    uuid::Uuid::parse_str(tenant_id)
        .map_err(|e| Error::InvalidInput(format!("bad tenant id in session key: {e}")))?;

    Ok((tenant_id.to_string(), phone.to_string()))
}
