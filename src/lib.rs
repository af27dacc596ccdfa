//! Justice Sync - offline-tolerant chat session client library
//!
//! This library keeps a local cache of Justice Agent chat sessions and
//! reconciles it with the agent's server-side sessions, so conversations
//! stay usable while the agent is unreachable.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `reconciler`: The session reconciler, the only writer of the cache
//! - `session`: Session and message types, id generation, merge rules
//! - `remote`: Justice Agent port, HTTP client and in-process fake
//! - `storage`: Local cache port with SQLite and in-memory stores
//! - `search`: Document search jobs and their polling
//! - `poller`: Cancellable fixed-interval polling
//! - `clock`: Injectable time source
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//! - `commands`: Handlers behind the CLI commands
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use justice_sync::{Config, SessionReconciler};
//! use justice_sync::remote::HttpSessionService;
//! use justice_sync::storage::SqliteChatStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let reconciler = SessionReconciler::new(
//!         Arc::new(SqliteChatStore::new()?),
//!         Arc::new(HttpSessionService::new(&config.agent)?),
//!         config.user.id.clone(),
//!         config.chat.clone(),
//!     );
//!     reconciler.initialize().await;
//!     reconciler.send_message("Olá").await;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod clock;
pub mod commands;
pub mod config;
pub mod error;
pub mod poller;
pub mod reconciler;
pub mod remote;
pub mod search;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use error::{JusticeSyncError, Result};
pub use reconciler::{AgentStatus, ReplyMode, SendOutcome, SessionReconciler};
pub use session::{ChatMessage, ChatSession, Role};

#[cfg(test)]
pub mod test_utils;
