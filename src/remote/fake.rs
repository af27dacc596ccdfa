//! Scripted in-process [`SessionService`] for tests
//!
//! [`FakeSessionService`] keeps its sessions and histories in memory and
//! records every call it receives. Tests script failures per operation and
//! can hold `run` calls open to observe the reconciler mid-send:
//!
//! ```
//! use justice_sync::remote::{FakeSessionService, SessionService};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let fake = FakeSessionService::new();
//! let created = fake.create_session("user-demo", None).await.unwrap();
//! assert_eq!(fake.list_sessions("user-demo").await.unwrap().len(), 1);
//!
//! fake.set_online(false);
//! assert!(fake.health().await.is_err());
//! # let _ = created;
//! # }
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use super::types::{RemoteMessage, RunResponse, SessionDescriptor, SessionHistory};
use super::SessionService;
use crate::error::{JusticeSyncError, Result};

/// One call observed by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    Health,
    CreateSession {
        user_id: String,
        session_name: Option<String>,
    },
    ListSessions(String),
    GetHistory(String),
    DeleteSession(String),
    Run {
        message: String,
        session_id: Option<String>,
    },
    ListModels,
}

#[derive(Debug, Default)]
struct FakeState {
    online: bool,
    sessions: Vec<SessionDescriptor>,
    histories: HashMap<String, Vec<RemoteMessage>>,
    failing_histories: HashSet<String>,
    fail_create: bool,
    fail_list: bool,
    fail_delete: bool,
    fail_run: Option<String>,
    server_name: Option<String>,
    reply: String,
    calls: Vec<FakeCall>,
    run_gate: Option<Arc<Semaphore>>,
}

/// In-memory Justice Agent
#[derive(Debug)]
pub struct FakeSessionService {
    state: Mutex<FakeState>,
    next_id: AtomicU64,
}

impl Default for FakeSessionService {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeSessionService {
    /// Create an online fake with no sessions
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                online: true,
                reply: "Resposta do agente".to_string(),
                ..FakeState::default()
            }),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a fake whose health probe fails
    pub fn offline() -> Self {
        let fake = Self::new();
        fake.set_online(false);
        fake
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: FakeCall) {
        self.state().calls.push(call);
    }

    /// Toggle availability; when offline every operation fails
    pub fn set_online(&self, online: bool) {
        self.state().online = online;
    }

    /// Seed a remote session with its history
    pub fn add_session(&self, descriptor: SessionDescriptor, messages: Vec<RemoteMessage>) {
        let mut state = self.state();
        state
            .histories
            .insert(descriptor.session_id.clone(), messages);
        state.sessions.push(descriptor);
    }

    /// Make `get_history` fail for one session id
    pub fn fail_history_for(&self, session_id: impl Into<String>) {
        self.state().failing_histories.insert(session_id.into());
    }

    /// Make `create_session` fail
    pub fn fail_create(&self, fail: bool) {
        self.state().fail_create = fail;
    }

    /// Make `list_sessions` fail
    pub fn fail_list(&self, fail: bool) {
        self.state().fail_list = fail;
    }

    /// Make `delete_session` fail
    pub fn fail_delete(&self, fail: bool) {
        self.state().fail_delete = fail;
    }

    /// Make `run` fail with the given message, or succeed again with `None`
    pub fn fail_run(&self, message: Option<&str>) {
        self.state().fail_run = message.map(str::to_string);
    }

    /// Name the agent assigns to created sessions, ignoring the requested one
    pub fn name_created_sessions(&self, name: Option<&str>) {
        self.state().server_name = name.map(str::to_string);
    }

    /// Text returned by successful `run` calls
    pub fn set_reply(&self, reply: impl Into<String>) {
        self.state().reply = reply.into();
    }

    /// Block `run` calls until [`release_runs`](Self::release_runs)
    pub fn hold_runs(&self) {
        self.state().run_gate = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let every held and future `run` call proceed
    pub fn release_runs(&self) {
        if let Some(gate) = self.state().run_gate.take() {
            gate.close();
        }
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<FakeCall> {
        self.state().calls.clone()
    }

    /// Number of `run` calls received so far
    pub fn run_count(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| matches!(c, FakeCall::Run { .. }))
            .count()
    }

    /// Ids of the sessions the fake currently holds
    pub fn session_ids(&self) -> Vec<String> {
        self.state()
            .sessions
            .iter()
            .map(|s| s.session_id.clone())
            .collect()
    }

    fn ensure_online(&self) -> Result<()> {
        if self.state().online {
            Ok(())
        } else {
            Err(JusticeSyncError::Remote(
                "Failed to reach Justice Agent: connection refused".into(),
            )
            .into())
        }
    }
}

fn status(status: u16, message: &str) -> anyhow::Error {
    JusticeSyncError::RemoteStatus {
        status,
        message: message.to_string(),
    }
    .into()
}

#[async_trait]
impl SessionService for FakeSessionService {
    async fn health(&self) -> Result<()> {
        self.record(FakeCall::Health);
        self.ensure_online()
    }

    async fn create_session(
        &self,
        user_id: &str,
        session_name: Option<&str>,
    ) -> Result<SessionDescriptor> {
        self.record(FakeCall::CreateSession {
            user_id: user_id.to_string(),
            session_name: session_name.map(str::to_string),
        });
        self.ensure_online()?;
        if self.state().fail_create {
            return Err(status(500, "Failed to create session"));
        }

        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let server_name = self.state().server_name.clone();
        let descriptor = SessionDescriptor {
            session_id: format!("remote-{}", n),
            user_id: user_id.to_string(),
            session_name: server_name.or_else(|| session_name.map(str::to_string)),
            created_at: Some(serde_json::json!(chrono::Utc::now().to_rfc3339())),
            message_count: 0,
        };
        self.add_session(descriptor.clone(), Vec::new());
        Ok(descriptor)
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionDescriptor>> {
        self.record(FakeCall::ListSessions(user_id.to_string()));
        self.ensure_online()?;
        let state = self.state();
        if state.fail_list {
            return Err(status(500, "Failed to list sessions"));
        }
        Ok(state
            .sessions
            .iter()
            .filter(|s| s.user_id.is_empty() || s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_history(&self, session_id: &str) -> Result<SessionHistory> {
        self.record(FakeCall::GetHistory(session_id.to_string()));
        self.ensure_online()?;
        let state = self.state();
        if state.failing_histories.contains(session_id) {
            return Err(status(500, "Failed to load history"));
        }
        match state.histories.get(session_id) {
            Some(messages) => Ok(SessionHistory {
                session_id: session_id.to_string(),
                message_count: messages.len(),
                messages: messages.clone(),
            }),
            None => Err(status(404, "Session not found")),
        }
    }

    async fn delete_session(&self, session_id: &str) -> Result<String> {
        self.record(FakeCall::DeleteSession(session_id.to_string()));
        self.ensure_online()?;
        let mut state = self.state();
        if state.fail_delete {
            return Err(status(500, "Failed to delete session"));
        }
        state.sessions.retain(|s| s.session_id != session_id);
        state.histories.remove(session_id);
        Ok(format!("Session {} deleted", session_id))
    }

    async fn run(&self, message: &str, session_id: Option<&str>) -> Result<RunResponse> {
        self.record(FakeCall::Run {
            message: message.to_string(),
            session_id: session_id.map(str::to_string),
        });

        let gate = self.state().run_gate.clone();
        if let Some(gate) = gate {
            // Closing the semaphore is the release signal
            let _ = gate.acquire().await;
        }

        self.ensure_online()?;
        let mut state = self.state();
        if let Some(error) = state.fail_run.clone() {
            return Err(status(500, &error));
        }

        let reply = state.reply.clone();
        if let Some(id) = session_id {
            let history = state.histories.entry(id.to_string()).or_default();
            history.push(RemoteMessage::new("user", message, None));
            history.push(RemoteMessage::new("assistant", reply.clone(), None));
        }

        Ok(RunResponse {
            message: reply,
            session_id: session_id.map(str::to_string),
            agent: "fake".to_string(),
        })
    }

    async fn list_models(&self) -> Result<serde_json::Value> {
        self.record(FakeCall::ListModels);
        self.ensure_online()?;
        Ok(serde_json::json!({"models": [{"id": "fake-model"}]}))
    }
}
