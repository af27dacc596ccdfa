use serde::{Deserialize, Serialize};

use super::ids;

/// Author of a chat message
///
/// The Justice Agent conversation only has two parties; anything else the
/// remote service reports is dropped at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message typed by the user
    User,
    /// Reply produced by the agent (or synthesized locally)
    Assistant,
}

impl Role {
    /// Parse a wire role, case-insensitively
    ///
    /// # Examples
    ///
    /// ```
    /// use justice_sync::session::Role;
    ///
    /// assert_eq!(Role::parse("USER"), Some(Role::User));
    /// assert_eq!(Role::parse("system"), None);
    /// ```
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }

    /// Wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One turn in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message identifier (`msg-<ULID>`)
    pub id: String,
    /// Who wrote the message
    pub role: Role,
    /// Raw message text
    pub content: String,
    /// Epoch milliseconds
    pub timestamp: i64,
}

impl ChatMessage {
    /// Create a message with a freshly generated id
    pub fn new(role: Role, content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: ids::message_id(),
            role,
            content: content.into(),
            timestamp,
        }
    }

    /// Create a user message
    ///
    /// # Examples
    ///
    /// ```
    /// use justice_sync::session::{ChatMessage, Role};
    ///
    /// let msg = ChatMessage::user("Olá", 1_700_000_000_000);
    /// assert_eq!(msg.role, Role::User);
    /// assert!(msg.id.starts_with("msg-"));
    /// ```
    pub fn user(content: impl Into<String>, timestamp: i64) -> Self {
        Self::new(Role::User, content, timestamp)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>, timestamp: i64) -> Self {
        Self::new(Role::Assistant, content, timestamp)
    }
}

/// A conversation thread as presented to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSession {
    /// Server-issued id, or a local-only id (`local-` / `chat-` prefix)
    pub id: String,
    /// Human-readable label
    pub title: String,
    /// Messages in conversation order
    pub messages: Vec<ChatMessage>,
    /// Epoch milliseconds of the last activity, the cross-session sort key
    pub last_activity: i64,
}

impl ChatSession {
    /// Create an empty session
    pub fn new(id: impl Into<String>, title: impl Into<String>, last_activity: i64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            messages: Vec::new(),
            last_activity,
        }
    }

    /// Whether the session only exists in the local cache
    pub fn is_local_only(&self) -> bool {
        ids::is_local_only(&self.id)
    }

    /// Whether the session was created but never written into
    ///
    /// A fresh session has no messages and still carries the placeholder
    /// title, so it can be reused instead of creating another empty one.
    pub fn is_fresh(&self, placeholder_title: &str) -> bool {
        self.messages.is_empty() && self.title == placeholder_title
    }
}

/// Persisted form of a session in the local cache
///
/// Matches the JSON layout of the `justice_agent_chats` slot:
/// `{id, title, messages, timestamp, synced}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    /// Session id
    pub id: String,
    /// Session title
    #[serde(default)]
    pub title: String,
    /// Session messages
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    /// Last activity in epoch milliseconds
    #[serde(default)]
    pub timestamp: i64,
    /// Whether the remote service was reachable when this record was written.
    /// Informational only.
    #[serde(default)]
    pub synced: bool,
}

impl ChatRecord {
    /// Build a record from an in-memory session
    pub fn from_session(session: &ChatSession, synced: bool) -> Self {
        Self {
            id: session.id.clone(),
            title: session.title.clone(),
            messages: session.messages.clone(),
            timestamp: session.last_activity,
            synced,
        }
    }

    /// Convert the record back into an in-memory session
    ///
    /// The `synced` flag is intentionally dropped here.
    pub fn into_session(self) -> ChatSession {
        ChatSession {
            id: self.id,
            title: self.title,
            messages: self.messages,
            last_activity: self.timestamp,
        }
    }
}
