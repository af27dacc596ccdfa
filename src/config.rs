//! Configuration management for Justice Sync
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{JusticeSyncError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Main configuration structure for Justice Sync
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Justice Agent connection settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Search API connection settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Identity of the local user
    #[serde(default)]
    pub user: UserConfig,

    /// Chat behavior
    #[serde(default)]
    pub chat: ChatConfig,

    /// Local session cache
    #[serde(default)]
    pub storage: StorageConfig,

    /// Search job polling
    #[serde(default)]
    pub polling: PollingConfig,
}

/// Justice Agent connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Base URL of the agent
    #[serde(default = "default_agent_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_agent_url() -> String {
    "http://localhost:8010".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_url: default_agent_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Search API connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the search API, including the `/api` prefix
    #[serde(default = "default_api_url")]
    pub base_url: String,

    /// Bearer token sent with every request
    #[serde(default)]
    pub token: Option<String>,
}

fn default_api_url() -> String {
    "http://localhost:8000/api".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            token: None,
        }
    }
}

/// Identity of the local user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    /// User id sessions are listed and created for
    #[serde(default = "default_user_id")]
    pub id: String,
}

fn default_user_id() -> String {
    "user-demo".to_string()
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            id: default_user_id(),
        }
    }
}

/// Chat behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Title given to sessions before their first user message
    #[serde(default = "default_placeholder_title")]
    pub placeholder_title: String,

    /// Maximum characters of the first user message used as a title
    #[serde(default = "default_title_max_chars")]
    pub title_max_chars: usize,

    /// Fetch every session history concurrently during initialization
    #[serde(default)]
    pub concurrent_history_fetch: bool,
}

fn default_placeholder_title() -> String {
    "Novo Chat".to_string()
}

fn default_title_max_chars() -> usize {
    30
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            placeholder_title: default_placeholder_title(),
            title_max_chars: default_title_max_chars(),
            concurrent_history_fetch: false,
        }
    }
}

/// Local session cache
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database path; the user data directory is used when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Search job polling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Seconds between polls
    #[serde(default = "default_poll_interval")]
    pub interval_seconds: u64,
}

fn default_poll_interval() -> u64 {
    5
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_poll_interval(),
        }
    }
}

impl Config {
    /// Load configuration from file, environment and CLI
    ///
    /// A missing file is not an error; defaults are used instead.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        tracing::debug!("Loaded configuration from {}", path);
        Ok(config)
    }

    fn apply_env_vars(&mut self) {
        if let Ok(url) = std::env::var("JUSTICE_AGENT_URL") {
            self.agent.base_url = url;
        }

        if let Ok(timeout) = std::env::var("JUSTICE_SYNC_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.agent.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid JUSTICE_SYNC_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(url) = std::env::var("JUSTICE_API_URL") {
            self.api.base_url = url;
        }

        if let Ok(token) = std::env::var("JUSTICE_API_TOKEN") {
            self.api.token = Some(token);
        }

        if let Ok(user_id) = std::env::var("JUSTICE_SYNC_USER_ID") {
            self.user.id = user_id;
        }

        if let Ok(concurrent) = std::env::var("JUSTICE_SYNC_CONCURRENT_HISTORY") {
            match concurrent.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.chat.concurrent_history_fetch = true,
                "0" | "false" | "no" => self.chat.concurrent_history_fetch = false,
                _ => tracing::warn!(
                    "Invalid value for JUSTICE_SYNC_CONCURRENT_HISTORY: {}",
                    concurrent
                ),
            }
        }

        if let Ok(interval) = std::env::var("JUSTICE_SYNC_POLL_INTERVAL") {
            if let Ok(value) = interval.parse() {
                self.polling.interval_seconds = value;
            } else {
                tracing::warn!("Invalid JUSTICE_SYNC_POLL_INTERVAL: {}", interval);
            }
        }

        if let Ok(path) = std::env::var(crate::storage::CACHE_DB_ENV) {
            self.storage.path = Some(PathBuf::from(path));
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(user) = &cli.user {
            self.user.id = user.clone();
        }

        if let Some(path) = &cli.cache_path {
            self.storage.path = Some(path.clone());
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`JusticeSyncError::Config`] describing the first invalid field
    pub fn validate(&self) -> Result<()> {
        validate_url("agent.base_url", &self.agent.base_url)?;
        validate_url("api.base_url", &self.api.base_url)?;

        if self.agent.timeout_seconds == 0 {
            return Err(JusticeSyncError::Config(
                "agent.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.agent.timeout_seconds > 600 {
            return Err(JusticeSyncError::Config(
                "agent.timeout_seconds must be less than or equal to 600".to_string(),
            )
            .into());
        }

        if self.user.id.trim().is_empty() {
            return Err(JusticeSyncError::Config("user.id cannot be empty".to_string()).into());
        }

        if self.chat.placeholder_title.trim().is_empty() {
            return Err(JusticeSyncError::Config(
                "chat.placeholder_title cannot be empty".to_string(),
            )
            .into());
        }

        if self.chat.title_max_chars == 0 {
            return Err(JusticeSyncError::Config(
                "chat.title_max_chars must be greater than 0".to_string(),
            )
            .into());
        }

        if self.polling.interval_seconds == 0 {
            return Err(JusticeSyncError::Config(
                "polling.interval_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

fn validate_url(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(JusticeSyncError::Config(format!("{} cannot be empty", field)).into());
    }

    let url = Url::parse(value)
        .map_err(|e| JusticeSyncError::Config(format!("{} is not a valid URL: {}", field, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(JusticeSyncError::Config(format!(
            "{} must use http or https, got {}",
            field, other
        ))
        .into()),
    }
}
