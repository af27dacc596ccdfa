//! Remote session service port
//!
//! [`SessionService`] is the seam between the reconciler and the Justice
//! Agent. [`HttpSessionService`] talks to a real agent over HTTP;
//! [`FakeSessionService`] is a scripted in-process double.

use async_trait::async_trait;

use crate::error::{JusticeSyncError, Result};

pub mod fake;
pub mod http;
pub mod types;

pub use fake::FakeSessionService;
pub use http::HttpSessionService;
pub use types::{RemoteMessage, RunResponse, SessionDescriptor, SessionHistory};

/// Operations the reconciler needs from the Justice Agent
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Probe availability; any error means the agent is unreachable
    async fn health(&self) -> Result<()>;

    /// Create a session owned by `user_id`
    async fn create_session(
        &self,
        user_id: &str,
        session_name: Option<&str>,
    ) -> Result<SessionDescriptor>;

    /// List the sessions owned by `user_id`
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionDescriptor>>;

    /// Fetch the message history of one session
    async fn get_history(&self, session_id: &str) -> Result<SessionHistory>;

    /// Delete one session, returning the service's confirmation text
    async fn delete_session(&self, session_id: &str) -> Result<String>;

    /// Send one user message and wait for the complete reply
    async fn run(&self, message: &str, session_id: Option<&str>) -> Result<RunResponse>;

    /// Models the agent can answer with, passed through as raw JSON
    async fn list_models(&self) -> Result<serde_json::Value> {
        Err(JusticeSyncError::Remote("Model listing is not supported".to_string()).into())
    }
}
