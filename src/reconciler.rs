//! Session reconciliation between the local cache and the Justice Agent
//!
//! [`SessionReconciler`] owns the merged session list a user interface
//! renders. It reads the local cache first so something is visible
//! immediately, then pulls the agent's sessions and merges them, with the
//! agent winning for every id it knows. Every mutation is written back to
//! the cache before any network call that depends on it.
//!
//! None of the operations return errors. Remote failures are logged and the
//! reconciler degrades to local-only behavior.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::join_all;

use crate::clock::{Clock, SystemClock};
use crate::config::ChatConfig;
use crate::remote::{SessionDescriptor, SessionService};
use crate::session::convert::{messages_from_remote, session_from_remote};
use crate::session::ids::{self, LocalIdKind};
use crate::session::merge::{self, SessionEvent, TitlePolicy};
use crate::session::{ChatMessage, ChatRecord, ChatSession};
use crate::storage::ChatStore;

/// Reply appended when a message cannot be delivered to the agent
pub const OFFLINE_REPLY: &str = "Desculpe, estou temporariamente indisponível. Sua mensagem foi salva localmente e será processada quando a conexão for restaurada.";

/// Reply appended when the agent was reachable but the run failed
pub fn error_reply(error: &anyhow::Error) -> String {
    format!(
        "Desculpe, ocorreu um erro ao processar sua mensagem: {}. Verifique se o Justice Agent está em execução.",
        error
    )
}

/// Reachability of the Justice Agent as last observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgentStatus {
    /// No probe has completed yet
    #[default]
    Connecting,
    /// The last health probe succeeded
    Connected,
    /// The last health probe failed
    Error,
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentStatus::Connecting => write!(f, "connecting"),
            AgentStatus::Connected => write!(f, "connected"),
            AgentStatus::Error => write!(f, "offline"),
        }
    }
}

/// Summary of an [`SessionReconciler::initialize`] run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitReport {
    /// Agent status after the probe
    pub status: AgentStatus,
    /// Sessions reported by the agent
    pub remote_sessions: usize,
    /// Cached sessions kept because the agent does not know them
    pub local_only_sessions: usize,
    /// Remote sessions whose history could not be fetched
    pub failed_histories: usize,
    /// Session selected after initialization
    pub selected: Option<String>,
}

/// How the assistant reply of a send was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyMode {
    /// The agent answered
    Agent,
    /// The agent was reached but the run failed
    Error,
    /// No network call was made
    Offline,
}

/// Result of [`SessionReconciler::send_message`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank text, or another send was still in flight
    Ignored,
    /// The user message and an assistant reply were appended
    Replied {
        /// Session the exchange was appended to
        session_id: String,
        /// Assistant reply text
        reply: String,
        /// Where the reply came from
        mode: ReplyMode,
    },
}

#[derive(Debug, Default)]
struct ReconcilerState {
    sessions: Vec<ChatSession>,
    active: Option<String>,
    status: AgentStatus,
}

struct SendGuard<'a>(&'a AtomicBool);

impl Drop for SendGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Merged view of local and remote chat sessions
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use justice_sync::config::ChatConfig;
/// use justice_sync::reconciler::{AgentStatus, SessionReconciler};
/// use justice_sync::remote::FakeSessionService;
/// use justice_sync::storage::MemoryChatStore;
///
/// # #[tokio::main]
/// # async fn main() {
/// let reconciler = SessionReconciler::new(
///     Arc::new(MemoryChatStore::new()),
///     Arc::new(FakeSessionService::offline()),
///     "user-demo",
///     ChatConfig::default(),
/// );
/// let report = reconciler.initialize().await;
/// assert_eq!(report.status, AgentStatus::Error);
/// assert_eq!(reconciler.sessions().len(), 1);
/// # }
/// ```
pub struct SessionReconciler {
    store: Arc<dyn ChatStore>,
    remote: Arc<dyn SessionService>,
    clock: Arc<dyn Clock>,
    user_id: String,
    chat: ChatConfig,
    titles: TitlePolicy,
    state: Mutex<ReconcilerState>,
    sending: AtomicBool,
}

impl SessionReconciler {
    /// Create a reconciler over injected storage and remote ports
    pub fn new(
        store: Arc<dyn ChatStore>,
        remote: Arc<dyn SessionService>,
        user_id: impl Into<String>,
        chat: ChatConfig,
    ) -> Self {
        let titles = TitlePolicy::new(chat.placeholder_title.clone(), chat.title_max_chars);
        Self {
            store,
            remote,
            clock: Arc::new(SystemClock),
            user_id: user_id.into(),
            chat,
            titles,
            state: Mutex::new(ReconcilerState::default()),
            sending: AtomicBool::new(false),
        }
    }

    /// Replace the clock used to stamp sessions and messages
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn lock(&self) -> MutexGuard<'_, ReconcilerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, state: &ReconcilerState) {
        let synced = state.status == AgentStatus::Connected;
        let records: Vec<ChatRecord> = state
            .sessions
            .iter()
            .map(|s| ChatRecord::from_session(s, synced))
            .collect();
        self.store.save_all(&records);
    }

    fn transition(&self, state: &mut ReconcilerState, event: SessionEvent) {
        let current = std::mem::take(&mut state.sessions);
        state.sessions = merge::apply(current, event, &self.titles);
    }

    /// Apply an event to the session list and persist the result
    fn apply(&self, event: SessionEvent) {
        let mut state = self.lock();
        self.transition(&mut state, event);
        self.persist(&state);
    }

    fn set_status(&self, status: AgentStatus) {
        self.lock().status = status;
    }

    fn find(&self, id: &str) -> Option<ChatSession> {
        self.lock().sessions.iter().find(|s| s.id == id).cloned()
    }

    /// Load the cache, probe the agent and merge its sessions
    pub async fn initialize(&self) -> InitReport {
        let cached: Vec<ChatSession> = self
            .store
            .load_all()
            .into_iter()
            .map(ChatRecord::into_session)
            .collect();
        tracing::debug!("Loaded {} sessions from cache", cached.len());

        {
            let mut state = self.lock();
            state.sessions = merge::sorted(cached);
            if state.active.is_none() {
                state.active = state.sessions.first().map(|s| s.id.clone());
            }
        }

        let mut report = InitReport {
            status: AgentStatus::Connecting,
            remote_sessions: 0,
            local_only_sessions: 0,
            failed_histories: 0,
            selected: None,
        };

        let mut local_only = None;
        if let Err(e) = self.remote.health().await {
            tracing::warn!("Justice Agent unavailable, working offline: {:#}", e);
            self.set_status(AgentStatus::Error);
        } else {
            self.set_status(AgentStatus::Connected);
            match self.remote.list_sessions(&self.user_id).await {
                Ok(descriptors) => {
                    let (remote, failed) = self.fetch_remote_sessions(&descriptors).await;
                    report.remote_sessions = remote.len();
                    report.failed_histories = failed;
                    local_only = Some(self.merge_remote(remote));
                }
                Err(e) => {
                    tracing::warn!("Failed to list remote sessions, keeping cache: {:#}", e);
                }
            }
        }

        if self.lock().sessions.is_empty() {
            let created = self.create_session(None).await;
            if created.is_local_only() {
                local_only = local_only.map(|n| n + 1);
            }
        }

        let state = self.lock();
        report.status = state.status;
        report.local_only_sessions = local_only.unwrap_or_else(|| {
            state.sessions.iter().filter(|s| s.is_local_only()).count()
        });
        report.selected = state.active.clone();
        tracing::info!(
            status = %report.status,
            remote = report.remote_sessions,
            local_only = report.local_only_sessions,
            "Sessions reconciled"
        );
        report
    }

    async fn fetch_remote_sessions(
        &self,
        descriptors: &[SessionDescriptor],
    ) -> (Vec<ChatSession>, usize) {
        let placeholder = self.chat.placeholder_title.as_str();
        let mut sessions = Vec::with_capacity(descriptors.len());
        let mut failed = 0;

        let histories = if self.chat.concurrent_history_fetch {
            join_all(
                descriptors
                    .iter()
                    .map(|d| self.remote.get_history(&d.session_id)),
            )
            .await
        } else {
            let mut results = Vec::with_capacity(descriptors.len());
            for d in descriptors {
                results.push(self.remote.get_history(&d.session_id).await);
            }
            results
        };

        let now = self.clock.now_millis();
        for (descriptor, history) in descriptors.iter().zip(histories) {
            let messages = match history {
                Ok(history) => Some(history.messages),
                Err(e) => {
                    tracing::warn!(
                        session_id = %descriptor.session_id,
                        "Failed to fetch session history: {:#}",
                        e
                    );
                    failed += 1;
                    None
                }
            };
            sessions.push(session_from_remote(descriptor, messages, placeholder, now));
        }

        (sessions, failed)
    }

    /// Merge fetched remote sessions into the list
    ///
    /// Returns how many local sessions the agent does not know.
    fn merge_remote(&self, remote: Vec<ChatSession>) -> usize {
        let mut state = self.lock();
        let remote_ids: HashSet<&str> = remote.iter().map(|s| s.id.as_str()).collect();
        let local_only = state
            .sessions
            .iter()
            .filter(|s| !remote_ids.contains(s.id.as_str()))
            .count();
        drop(remote_ids);
        self.transition(&mut state, SessionEvent::Merged(remote));

        let active_known = state
            .active
            .as_ref()
            .is_some_and(|id| state.sessions.iter().any(|s| &s.id == id));
        if !active_known {
            state.active = state.sessions.first().map(|s| s.id.clone());
        }
        self.persist(&state);
        local_only
    }

    /// Create a session and make it active
    ///
    /// An active session that is still empty and untitled is reused instead,
    /// taking the suggested title if one is given.
    pub async fn create_session(&self, suggested_title: Option<&str>) -> ChatSession {
        if let Some(active) = self.active_session() {
            if active.is_fresh(&self.chat.placeholder_title) {
                tracing::debug!(session_id = %active.id, "Reusing fresh session");
                return match suggested_title.map(str::trim).filter(|t| !t.is_empty()) {
                    Some(title) => self.rename(&active.id, title).unwrap_or(active),
                    None => active,
                };
            }
        }
        self.create_new(suggested_title, LocalIdKind::Explicit).await
    }

    async fn create_new(&self, suggested_title: Option<&str>, kind: LocalIdKind) -> ChatSession {
        let suggested = suggested_title.map(str::trim).filter(|t| !t.is_empty());
        let title = suggested.unwrap_or(&self.chat.placeholder_title).to_string();

        let remote = if self.status() == AgentStatus::Error {
            None
        } else {
            match self.remote.create_session(&self.user_id, suggested).await {
                Ok(descriptor) => Some(descriptor),
                Err(e) => {
                    tracing::warn!("Failed to create remote session, using local id: {:#}", e);
                    None
                }
            }
        };

        let now = self.clock.now_millis();
        let session = match remote {
            Some(descriptor) => {
                let mut session = session_from_remote(&descriptor, None, &title, now);
                session.last_activity = now;
                session
            }
            None => ChatSession::new(ids::local_session_id(kind, now), title, now),
        };

        tracing::info!(session_id = %session.id, "Created session");
        {
            let mut state = self.lock();
            self.transition(&mut state, SessionEvent::Created(session.clone()));
            state.active = Some(session.id.clone());
            self.persist(&state);
        }
        session
    }

    fn rename(&self, id: &str, title: &str) -> Option<ChatSession> {
        tracing::debug!(session_id = %id, "Renaming session to {}", title);
        self.apply(SessionEvent::Renamed {
            session_id: id.to_string(),
            title: title.to_string(),
        });
        self.find(id)
    }

    /// Make a session active and return its messages
    ///
    /// Remote-backed sessions are refreshed from the agent; the cached
    /// messages are returned if that fails. Returns `None` for unknown ids.
    pub async fn select_session(&self, id: &str) -> Option<Vec<ChatMessage>> {
        let cached = self.find(id)?;
        self.lock().active = Some(id.to_string());

        if cached.is_local_only() {
            return Some(cached.messages);
        }

        match self.remote.get_history(id).await {
            Ok(history) => {
                let messages = messages_from_remote(history.messages, self.clock.now_millis());
                self.apply(SessionEvent::HistoryReplaced {
                    session_id: id.to_string(),
                    messages: messages.clone(),
                });
                Some(messages)
            }
            Err(e) => {
                tracing::warn!(session_id = %id, "Failed to refresh history, using cache: {:#}", e);
                Some(cached.messages)
            }
        }
    }

    /// Send a message in the active session
    ///
    /// The user message is persisted before the agent is contacted. Only
    /// one send may be in flight; overlapping calls are ignored.
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::Ignored;
        }
        if self
            .sending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("Send already in flight, ignoring message");
            return SendOutcome::Ignored;
        }
        let _guard = SendGuard(&self.sending);

        let session_id = match self.active_session() {
            Some(session) => session.id,
            None => self.create_new(None, LocalIdKind::MessageTriggered).await.id,
        };

        self.apply(SessionEvent::MessageAppended {
            session_id: session_id.clone(),
            message: ChatMessage::user(text, self.clock.now_millis()),
        });

        let (reply, mode) =
            if !ids::is_local_only(&session_id) && self.status() == AgentStatus::Connected {
                match self.remote.run(text, Some(&session_id)).await {
                    Ok(response) => (response.message, ReplyMode::Agent),
                    Err(e) => {
                        tracing::error!(session_id = %session_id, "Agent run failed: {:#}", e);
                        (error_reply(&e), ReplyMode::Error)
                    }
                }
            } else {
                tracing::debug!(session_id = %session_id, "Agent unreachable, replying offline");
                (OFFLINE_REPLY.to_string(), ReplyMode::Offline)
            };

        self.apply(SessionEvent::MessageAppended {
            session_id: session_id.clone(),
            message: ChatMessage::assistant(reply.clone(), self.clock.now_millis()),
        });

        SendOutcome::Replied {
            session_id,
            reply,
            mode,
        }
    }

    /// Delete a session locally and, when remote-backed, on the agent
    ///
    /// Returns whether the session existed locally. The local removal
    /// happens even if the remote delete fails.
    pub async fn delete_session(&self, id: &str) -> bool {
        if !ids::is_local_only(id) {
            match self.remote.delete_session(id).await {
                Ok(message) => tracing::debug!(session_id = %id, "{}", message),
                Err(e) => tracing::warn!(session_id = %id, "Remote delete failed: {:#}", e),
            }
        }

        let mut state = self.lock();
        let existed = state.sessions.iter().any(|s| s.id == id);
        self.transition(&mut state, SessionEvent::Deleted(id.to_string()));
        if state.active.as_deref() == Some(id) {
            state.active = None;
        }
        self.persist(&state);
        existed
    }

    /// Sessions sorted by last activity, most recent first
    pub fn sessions(&self) -> Vec<ChatSession> {
        self.lock().sessions.clone()
    }

    /// Id of the active session
    pub fn active_session_id(&self) -> Option<String> {
        self.lock().active.clone()
    }

    /// The active session, if it still exists
    pub fn active_session(&self) -> Option<ChatSession> {
        let state = self.lock();
        let id = state.active.as_ref()?;
        state.sessions.iter().find(|s| &s.id == id).cloned()
    }

    /// Messages of the active session
    pub fn active_messages(&self) -> Vec<ChatMessage> {
        self.active_session()
            .map(|s| s.messages)
            .unwrap_or_default()
    }

    /// Agent status as last observed
    pub fn status(&self) -> AgentStatus {
        self.lock().status
    }

    /// Whether a send is in flight
    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::SeqCst)
    }
}
