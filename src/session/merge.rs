//! Pure session-list transitions
//!
//! Every mutation of the merged view goes through [`apply`], which takes the
//! current list and an event and returns the new list, sorted by
//! `last_activity` descending. Nothing here touches storage or the network.

use std::collections::HashSet;

use super::types::{ChatMessage, ChatSession, Role};

/// Rules for deriving a session title from its first user message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitlePolicy {
    /// Title given to sessions that have not been written into yet
    pub placeholder: String,
    /// Number of characters of the first user message used as the title
    pub max_chars: usize,
}

impl TitlePolicy {
    /// Create a title policy
    pub fn new(placeholder: impl Into<String>, max_chars: usize) -> Self {
        Self {
            placeholder: placeholder.into(),
            max_chars,
        }
    }

    /// Title derived from a message body: its first `max_chars` characters
    ///
    /// # Examples
    ///
    /// ```
    /// use justice_sync::session::TitlePolicy;
    ///
    /// let policy = TitlePolicy::new("Novo Chat", 5);
    /// assert_eq!(policy.derive("Processo 123"), "Proce");
    /// ```
    pub fn derive(&self, content: &str) -> String {
        content
            .trim()
            .chars()
            .take(self.max_chars)
            .collect::<String>()
            .trim_end()
            .to_string()
    }
}

impl Default for TitlePolicy {
    fn default() -> Self {
        Self::new("Novo Chat", 30)
    }
}

/// A change to the merged session list
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A new session was created; it goes to the front
    Created(ChatSession),
    /// A message was appended to a session
    MessageAppended {
        /// Target session id
        session_id: String,
        /// The appended message
        message: ChatMessage,
    },
    /// Authoritative history was fetched for a session
    HistoryReplaced {
        /// Target session id
        session_id: String,
        /// Messages that replace the cached ones entirely
        messages: Vec<ChatMessage>,
    },
    /// A session was given a new title
    Renamed {
        /// Target session id
        session_id: String,
        /// New title
        title: String,
    },
    /// A session was deleted
    Deleted(String),
    /// Remote sessions were fetched and must be merged with the local list
    Merged(Vec<ChatSession>),
}

/// Apply an event to a session list and return the new, sorted list
pub fn apply(
    sessions: Vec<ChatSession>,
    event: SessionEvent,
    titles: &TitlePolicy,
) -> Vec<ChatSession> {
    let next = match event {
        SessionEvent::Created(session) => {
            let mut next = Vec::with_capacity(sessions.len() + 1);
            let id = session.id.clone();
            next.push(session);
            next.extend(sessions.into_iter().filter(|s| s.id != id));
            next
        }
        SessionEvent::MessageAppended {
            session_id,
            message,
        } => sessions
            .into_iter()
            .map(|s| {
                if s.id == session_id {
                    append_message(s, message.clone(), titles)
                } else {
                    s
                }
            })
            .collect(),
        SessionEvent::HistoryReplaced {
            session_id,
            messages,
        } => sessions
            .into_iter()
            .map(|mut s| {
                if s.id == session_id {
                    s.messages = messages.clone();
                }
                s
            })
            .collect(),
        SessionEvent::Renamed { session_id, title } => sessions
            .into_iter()
            .map(|mut s| {
                if s.id == session_id {
                    s.title = title.clone();
                }
                s
            })
            .collect(),
        SessionEvent::Deleted(id) => sessions.into_iter().filter(|s| s.id != id).collect(),
        SessionEvent::Merged(remote) => merge_sessions(remote, sessions),
    };
    sorted(next)
}

/// Merge remote sessions with the local list
///
/// Every remote session is kept with its remote messages. A local session
/// survives only if its id is unknown to the remote service. Duplicate ids
/// inside either list keep their first occurrence.
pub fn merge_sessions(remote: Vec<ChatSession>, local: Vec<ChatSession>) -> Vec<ChatSession> {
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(remote.len() + local.len());

    for session in remote.into_iter().chain(local) {
        if seen.insert(session.id.clone()) {
            merged.push(session);
        }
    }

    sorted(merged)
}

/// Sort sessions by `last_activity`, most recent first
///
/// The sort is stable, so sessions with equal activity keep their relative
/// order.
pub fn sorted(mut sessions: Vec<ChatSession>) -> Vec<ChatSession> {
    sessions.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
    sessions
}

fn append_message(
    mut session: ChatSession,
    message: ChatMessage,
    titles: &TitlePolicy,
) -> ChatSession {
    if message.role == Role::User && session.title == titles.placeholder {
        let derived = titles.derive(&message.content);
        if !derived.is_empty() {
            session.title = derived;
        }
    }
    session.last_activity = session.last_activity.max(message.timestamp);
    session.messages.push(message);
    session
}
