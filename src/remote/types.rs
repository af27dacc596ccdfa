//! Wire types for the Justice Agent session API
//!
//! Response types are deliberately lenient: every field that the agent may
//! omit has a default, and timestamps are kept as raw JSON values until
//! [`crate::session::convert`] normalizes them.

use serde::{Deserialize, Serialize};

/// Request body for `POST /v1/sessions`
#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionRequest<'a> {
    /// Owner of the session
    pub user_id: &'a str,
    /// Optional display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_name: Option<&'a str>,
}

/// Session descriptor returned by create and list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDescriptor {
    /// Server-issued session id
    pub session_id: String,
    /// Owner of the session
    #[serde(default)]
    pub user_id: String,
    /// Display name
    #[serde(default)]
    pub session_name: Option<String>,
    /// Creation time, RFC 3339 string or epoch number
    #[serde(default)]
    pub created_at: Option<serde_json::Value>,
    /// Number of messages stored remotely
    #[serde(default)]
    pub message_count: usize,
}

/// Response body for `GET /v1/sessions`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionListResponse {
    /// Sessions visible to the user
    #[serde(default)]
    pub sessions: Vec<SessionDescriptor>,
}

/// One message as reported by the agent's history endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteMessage {
    /// Role name; only `user` and `assistant` survive conversion
    #[serde(default)]
    pub role: String,
    /// Message text
    #[serde(default)]
    pub content: String,
    /// Epoch seconds, epoch milliseconds or an RFC 3339 string
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
}

impl RemoteMessage {
    /// Build a remote message, mostly useful for fakes and tests
    pub fn new(
        role: impl Into<String>,
        content: impl Into<String>,
        timestamp: Option<serde_json::Value>,
    ) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            timestamp,
        }
    }
}

/// Response body for `GET /v1/sessions/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionHistory {
    /// Session id echoed by the server
    #[serde(default)]
    pub session_id: String,
    /// Messages in conversation order
    #[serde(default)]
    pub messages: Vec<RemoteMessage>,
    /// Number of messages
    #[serde(default)]
    pub message_count: usize,
}

/// Request body for `POST /v1/run`
#[derive(Debug, Clone, Serialize)]
pub struct RunRequest<'a> {
    /// User message
    pub message: &'a str,
    /// Always `false`; streaming is not supported
    pub stream: bool,
    /// Session the message belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<&'a str>,
}

/// Response body for `POST /v1/run`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResponse {
    /// Assistant reply
    pub message: String,
    /// Session the reply belongs to
    #[serde(default)]
    pub session_id: Option<String>,
    /// Name of the agent that answered
    #[serde(default)]
    pub agent: String,
}

/// Response body for `DELETE /v1/sessions/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteResponse {
    /// Confirmation text
    #[serde(default)]
    pub message: String,
}

/// Error body shape used by the agent and the search API
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}
