//! Identifier generation for sessions and messages
//!
//! Server-issued session ids are opaque. Sessions synthesized without the
//! remote service carry a namespace prefix followed by a millisecond
//! timestamp, so they can be recognized later and never fetched remotely.

use std::sync::atomic::{AtomicI64, Ordering};
use ulid::Ulid;

/// Prefix for sessions created explicitly while the agent is unreachable
pub const LOCAL_PREFIX: &str = "local-";

/// Prefix for sessions created implicitly by a first message while the
/// agent is unreachable
pub const CHAT_PREFIX: &str = "chat-";

/// Prefix for message ids
pub const MESSAGE_PREFIX: &str = "msg-";

static LAST_LOCAL_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Namespace used when synthesizing a local-only session id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalIdKind {
    /// Explicit "new chat" action
    Explicit,
    /// First message sent with no active session
    MessageTriggered,
}

impl LocalIdKind {
    fn prefix(self) -> &'static str {
        match self {
            Self::Explicit => LOCAL_PREFIX,
            Self::MessageTriggered => CHAT_PREFIX,
        }
    }
}

/// Whether a session id belongs to a session never registered remotely
///
/// # Examples
///
/// ```
/// use justice_sync::session::ids::is_local_only;
///
/// assert!(is_local_only("local-1700000000000"));
/// assert!(is_local_only("chat-1700000000000"));
/// assert!(!is_local_only("3f0c9a4e-2b7d-4c55-9a11-8e0f5d6c7b21"));
/// ```
pub fn is_local_only(id: &str) -> bool {
    id.starts_with(LOCAL_PREFIX) || id.starts_with(CHAT_PREFIX)
}

/// Generate a local-only session id
///
/// The numeric part is `now_millis`, bumped forward when needed so ids
/// handed out by this process are strictly increasing.
pub fn local_session_id(kind: LocalIdKind, now_millis: i64) -> String {
    let mut previous = LAST_LOCAL_MILLIS.load(Ordering::Relaxed);
    let stamp = loop {
        let candidate = now_millis.max(previous + 1);
        match LAST_LOCAL_MILLIS.compare_exchange_weak(
            previous,
            candidate,
            Ordering::AcqRel,
            Ordering::Relaxed,
        ) {
            Ok(_) => break candidate,
            Err(current) => previous = current,
        }
    };
    format!("{}{}", kind.prefix(), stamp)
}

/// Generate a unique message id
pub fn message_id() -> String {
    format!("{}{}", MESSAGE_PREFIX, Ulid::new())
}
