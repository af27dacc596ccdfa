//! Document search jobs
//!
//! Search jobs run on the backend API and move through phases while they
//! collect court processes. [`poll_searches`] watches the job list until
//! every job has either completed or failed.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{AgentConfig, ApiConfig};
use crate::error::{JusticeSyncError, Result};
use crate::poller::{PollHandle, Poller};
use crate::remote::http::status_error;

/// Lifecycle status of a search job
///
/// Unknown wire values are kept verbatim in [`SearchStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SearchStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Other(String),
}

impl SearchStatus {
    /// Whether the job will not change any more
    pub fn is_terminal(&self) -> bool {
        matches!(self, SearchStatus::Completed | SearchStatus::Failed)
    }

    /// Wire representation
    pub fn as_str(&self) -> &str {
        match self {
            SearchStatus::Pending => "PENDING",
            SearchStatus::Processing => "PROCESSING",
            SearchStatus::Completed => "COMPLETED",
            SearchStatus::Failed => "FAILED",
            SearchStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for SearchStatus {
    fn from(value: String) -> Self {
        match value.to_uppercase().as_str() {
            "PENDING" => SearchStatus::Pending,
            "PROCESSING" => SearchStatus::Processing,
            "COMPLETED" => SearchStatus::Completed,
            "FAILED" => SearchStatus::Failed,
            _ => SearchStatus::Other(value),
        }
    }
}

impl From<SearchStatus> for String {
    fn from(status: SearchStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One search job as reported by `GET /searches`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchJob {
    pub id: String,
    /// Document (CPF/CNPJ) or process number searched for
    #[serde(default)]
    pub document: String,
    #[serde(default)]
    pub created_at: String,
    pub status: SearchStatus,
    /// Percentage, 0 to 100
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub result_count: u64,
    #[serde(default)]
    pub current_phase: Option<String>,
    #[serde(default)]
    pub total_detail_jobs: Option<u64>,
    #[serde(default)]
    pub completed_detail_jobs: Option<u64>,
    #[serde(default)]
    pub download_url: Option<String>,
}

impl SearchJob {
    /// Human-readable description of where the job is
    ///
    /// # Examples
    ///
    /// ```
    /// use justice_sync::search::{SearchJob, SearchStatus};
    ///
    /// let job: SearchJob = serde_json::from_value(serde_json::json!({
    ///     "id": "1",
    ///     "status": "PROCESSING",
    ///     "current_phase": "COLLECTING_DETAILS",
    ///     "completed_detail_jobs": 3,
    ///     "total_detail_jobs": 10
    /// })).unwrap();
    /// assert_eq!(job.phase_message(), "Processando detalhes (3/10)");
    /// ```
    pub fn phase_message(&self) -> String {
        if self.status == SearchStatus::Pending {
            return "Aguardando início...".to_string();
        }
        match self.current_phase.as_deref() {
            Some("STARTING") => return "Iniciando busca...".to_string(),
            Some("PAGINATING") => return "Coletando processos...".to_string(),
            Some("COLLECTING_DETAILS") => {
                return format!(
                    "Processando detalhes ({}/{})",
                    self.completed_detail_jobs.unwrap_or(0),
                    self.total_detail_jobs.unwrap_or(0)
                )
            }
            _ => {}
        }
        match self.status {
            SearchStatus::Completed if self.result_count == 0 => {
                "Nenhum processo encontrado".to_string()
            }
            SearchStatus::Completed => "Concluído".to_string(),
            SearchStatus::Failed => "Falhou".to_string(),
            _ => "Processando...".to_string(),
        }
    }
}

/// Whether every job is terminal; vacuously true for an empty list
pub fn all_settled(jobs: &[SearchJob]) -> bool {
    jobs.iter().all(|job| job.status.is_terminal())
}

/// Search API port
#[async_trait]
pub trait SearchApi: Send + Sync {
    /// List the current user's search jobs
    async fn list_searches(&self) -> Result<Vec<SearchJob>>;
}

/// Search API client backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpSearchApi {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpSearchApi {
    /// Build a client from the API settings, reusing the agent timeout
    pub fn new(api: &ApiConfig, agent: &AgentConfig) -> Result<Self> {
        let base_url = Url::parse(&api.base_url).map_err(|e| {
            JusticeSyncError::Config(format!("Invalid API URL {}: {}", api.base_url, e))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(agent.timeout_seconds))
            .user_agent(concat!("justice-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| JusticeSyncError::Remote(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            token: api.token.clone(),
        })
    }

    fn searches_url(&self) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                JusticeSyncError::Config(format!("API URL cannot be a base: {}", self.base_url))
            })?
            .pop_if_empty()
            .push("searches");
        Ok(url)
    }
}

#[async_trait]
impl SearchApi for HttpSearchApi {
    async fn list_searches(&self) -> Result<Vec<SearchJob>> {
        let url = self.searches_url()?;
        tracing::debug!("Listing searches: {}", url);

        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!("Failed to reach search API: {}", e);
            JusticeSyncError::Remote(format!("Failed to reach search API: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(status_error(response).await.into());
        }

        response.json::<Vec<SearchJob>>().await.map_err(|e| {
            tracing::error!("Failed to parse searches response: {}", e);
            JusticeSyncError::Remote(format!("Failed to parse searches response: {}", e)).into()
        })
    }
}

/// Outcome of [`poll_searches`]
#[derive(Debug)]
pub enum SearchWatch {
    /// Every job was already terminal; no polling was started
    Settled(Vec<SearchJob>),
    /// Some jobs are still running; updates arrive on the handle
    Polling {
        /// Result of the initial fetch
        initial: Vec<SearchJob>,
        /// Subsequent snapshots, the last of which is fully settled
        updates: PollHandle<Vec<SearchJob>>,
    },
}

/// Fetch search jobs once and keep polling while any is still running
///
/// # Errors
///
/// Returns error if the initial fetch fails. Later failures are logged by
/// the poller and retried.
pub async fn poll_searches(api: Arc<dyn SearchApi>, period: Duration) -> Result<SearchWatch> {
    let initial = api.list_searches().await?;
    if all_settled(&initial) {
        tracing::debug!("All {} searches already settled", initial.len());
        return Ok(SearchWatch::Settled(initial));
    }

    let updates = Poller::new(period).spawn(
        move || {
            let api = api.clone();
            async move { api.list_searches().await }
        },
        |jobs: &Vec<SearchJob>| all_settled(jobs),
    );

    Ok(SearchWatch::Polling { initial, updates })
}
