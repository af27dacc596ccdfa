//! HTTP client for the Justice Agent session API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use url::Url;

use super::types::{
    CreateSessionRequest, DeleteResponse, ErrorBody, RunRequest, RunResponse, SessionDescriptor,
    SessionHistory, SessionListResponse,
};
use super::SessionService;
use crate::config::AgentConfig;
use crate::error::{JusticeSyncError, Result};

/// Justice Agent client backed by `reqwest`
///
/// # Examples
///
/// ```
/// use justice_sync::config::AgentConfig;
/// use justice_sync::remote::HttpSessionService;
///
/// let service = HttpSessionService::new(&AgentConfig::default()).unwrap();
/// assert_eq!(service.base_url().as_str(), "http://localhost:8010/");
/// ```
#[derive(Debug, Clone)]
pub struct HttpSessionService {
    client: Client,
    base_url: Url,
}

impl HttpSessionService {
    /// Build a client for the agent described by `config`
    ///
    /// # Errors
    ///
    /// Returns error if the base URL does not parse or the HTTP client
    /// cannot be built
    pub fn new(config: &AgentConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            JusticeSyncError::Config(format!("Invalid agent URL {}: {}", config.base_url, e))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("justice-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| JusticeSyncError::Remote(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized Justice Agent client: base_url={}, timeout={}s",
            base_url,
            config.timeout_seconds
        );

        Ok(Self { client, base_url })
    }

    /// Base URL every endpoint is resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an endpoint, percent-encoding each path segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                JusticeSyncError::Config(format!("Agent URL cannot be a base: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder, what: &str) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!("Failed to reach Justice Agent ({}): {}", what, e);
            JusticeSyncError::Remote(format!("Failed to reach Justice Agent: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(status_error(response).await.into());
        }
        Ok(response)
    }
}

/// Turn a non-success response into a [`JusticeSyncError::RemoteStatus`]
///
/// Uses the body's `error` field when present, otherwise a generic status
/// message. A body that is not JSON yields "Unknown error occurred".
pub(crate) async fn status_error(response: Response) -> JusticeSyncError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    tracing::error!("Remote service returned error {}: {}", status, body);

    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody {
            error: Some(error), ..
        }) if !error.is_empty() => error,
        Ok(ErrorBody {
            detail: Some(serde_json::Value::String(detail)),
            ..
        }) if !detail.is_empty() => detail,
        Ok(_) => format!("Request failed with status {}", status),
        Err(_) => "Unknown error occurred".to_string(),
    };

    JusticeSyncError::RemoteStatus { status, message }
}

async fn parse_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    response.json::<T>().await.map_err(|e| {
        tracing::error!("Failed to parse {} response: {}", what, e);
        JusticeSyncError::Remote(format!("Failed to parse {} response: {}", what, e)).into()
    })
}

#[async_trait]
impl SessionService for HttpSessionService {
    async fn health(&self) -> Result<()> {
        let url = self.endpoint(&["health"])?;
        tracing::debug!("Probing Justice Agent health: {}", url);
        self.send(self.client.get(url), "health").await?;
        Ok(())
    }

    async fn create_session(
        &self,
        user_id: &str,
        session_name: Option<&str>,
    ) -> Result<SessionDescriptor> {
        let url = self.endpoint(&["v1", "sessions"])?;
        tracing::debug!("Creating session for user {}: {}", user_id, url);
        let body = CreateSessionRequest {
            user_id,
            session_name,
        };
        let response = self
            .send(self.client.post(url).json(&body), "create session")
            .await?;
        parse_json(response, "create session").await
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionDescriptor>> {
        let mut url = self.endpoint(&["v1", "sessions"])?;
        url.query_pairs_mut().append_pair("user_id", user_id);
        tracing::debug!("Listing sessions: {}", url);
        let response = self.send(self.client.get(url), "list sessions").await?;
        let list: SessionListResponse = parse_json(response, "list sessions").await?;
        tracing::debug!("Agent reported {} sessions", list.sessions.len());
        Ok(list.sessions)
    }

    async fn get_history(&self, session_id: &str) -> Result<SessionHistory> {
        let url = self.endpoint(&["v1", "sessions", session_id])?;
        tracing::debug!("Fetching session history: {}", url);
        let response = self.send(self.client.get(url), "session history").await?;
        parse_json(response, "session history").await
    }

    async fn delete_session(&self, session_id: &str) -> Result<String> {
        let url = self.endpoint(&["v1", "sessions", session_id])?;
        tracing::debug!("Deleting session: {}", url);
        let response = self
            .send(self.client.delete(url), "delete session")
            .await?;
        let confirmation: DeleteResponse = parse_json(response, "delete session").await?;
        Ok(confirmation.message)
    }

    async fn run(&self, message: &str, session_id: Option<&str>) -> Result<RunResponse> {
        let url = self.endpoint(&["v1", "run"])?;
        tracing::debug!(session_id = ?session_id, "Sending message to agent: {}", url);
        let body = RunRequest {
            message,
            stream: false,
            session_id,
        };
        let response = self.send(self.client.post(url).json(&body), "run").await?;
        parse_json(response, "run").await
    }

    async fn list_models(&self) -> Result<serde_json::Value> {
        let url = self.endpoint(&["v1", "models"])?;
        tracing::debug!("Listing models: {}", url);
        let response = self.send(self.client.get(url), "list models").await?;
        parse_json(response, "list models").await
    }
}
