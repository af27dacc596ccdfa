//! Coercion of remote payloads into typed sessions and messages
//!
//! The agent reports timestamps inconsistently: epoch seconds, epoch
//! milliseconds, RFC 3339 strings, or nothing at all. Everything is turned
//! into epoch milliseconds here so the rest of the crate only sees `i64`.

use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;

use super::types::{ChatMessage, ChatSession, Role};
use crate::remote::types::{RemoteMessage, SessionDescriptor};

/// Numeric timestamps below this are epoch seconds, not milliseconds
///
/// `100_000_000_000` ms is March 1973; as seconds it is year 5138.
pub const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Normalize a raw timestamp into epoch milliseconds
///
/// # Examples
///
/// ```
/// use justice_sync::session::convert::normalize_timestamp;
/// use serde_json::json;
///
/// let now = 1_800_000_000_000;
/// assert_eq!(normalize_timestamp(Some(&json!(1700000000)), now), 1_700_000_000_000);
/// assert_eq!(normalize_timestamp(Some(&json!(1700000000123_i64)), now), 1_700_000_000_123);
/// assert_eq!(normalize_timestamp(None, now), now);
/// ```
pub fn normalize_timestamp(raw: Option<&Value>, now_millis: i64) -> i64 {
    match raw {
        Some(Value::Number(n)) => n.as_f64().and_then(scale_number).unwrap_or(now_millis),
        Some(Value::String(s)) => parse_timestamp_str(s).unwrap_or(now_millis),
        _ => now_millis,
    }
}

fn scale_number(value: f64) -> Option<i64> {
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    if value < EPOCH_MILLIS_THRESHOLD as f64 {
        Some((value * 1000.0).round() as i64)
    } else {
        Some(value.round() as i64)
    }
}

fn parse_timestamp_str(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(number) = trimmed.parse::<f64>() {
        return scale_number(number);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.timestamp_millis());
    }
    // Python's isoformat() omits the offset for naive datetimes
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}

/// Convert remote history into typed messages
///
/// Messages with a role other than `user`/`assistant` are dropped.
pub fn messages_from_remote(messages: Vec<RemoteMessage>, now_millis: i64) -> Vec<ChatMessage> {
    messages
        .into_iter()
        .filter_map(|raw| {
            let Some(role) = Role::parse(&raw.role) else {
                tracing::debug!(role = %raw.role, "Dropping remote message with unsupported role");
                return None;
            };
            Some(ChatMessage::new(
                role,
                raw.content,
                normalize_timestamp(raw.timestamp.as_ref(), now_millis),
            ))
        })
        .collect()
}

/// Build a session from a remote descriptor and, if it was fetched, its history
///
/// `last_activity` is the later of the creation time and the newest message.
pub fn session_from_remote(
    descriptor: &SessionDescriptor,
    history: Option<Vec<RemoteMessage>>,
    placeholder_title: &str,
    now_millis: i64,
) -> ChatSession {
    let created = normalize_timestamp(descriptor.created_at.as_ref(), now_millis);
    let messages = history
        .map(|h| messages_from_remote(h, now_millis))
        .unwrap_or_default();
    let newest = messages.iter().map(|m| m.timestamp).max().unwrap_or(created);

    let title = descriptor
        .session_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(placeholder_title)
        .to_string();

    ChatSession {
        id: descriptor.session_id.clone(),
        title,
        messages,
        last_activity: created.max(newest),
    }
}
