/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint:

- `chat`:     Interactive chat with session management
- `send`:     One-shot message
- `sessions`: List and delete sessions
- `health`:   Probe the Justice Agent
- `models`:   Print the agent's model list
- `searches`: Watch document search jobs

Every handler builds its own [`SessionReconciler`] (or client) from the
loaded [`Config`].
*/

use crate::config::Config;
use crate::error::Result;
use crate::reconciler::{AgentStatus, InitReport, ReplyMode, SessionReconciler};
use crate::remote::HttpSessionService;
use crate::session::{ChatMessage, ChatSession, Role};
use crate::storage::SqliteChatStore;
use chrono::{Local, TimeZone};
use colored::Colorize;
use std::sync::Arc;

// Special commands parser for the interactive loop
pub mod special_commands;

// Session listing and deletion
pub mod sessions;

/// Open the session cache selected by the configuration
pub fn open_store(config: &Config) -> Result<SqliteChatStore> {
    match &config.storage.path {
        Some(path) => SqliteChatStore::new_with_path(path),
        None => SqliteChatStore::new(),
    }
}

/// Build a reconciler over the SQLite cache and the HTTP agent client
pub fn build_reconciler(config: &Config) -> Result<SessionReconciler> {
    let store = open_store(config)?;
    if let Err(e) = store.save_current_user(&config.user.id) {
        tracing::warn!("Failed to remember current user: {:#}", e);
    }
    let remote = HttpSessionService::new(&config.agent)?;

    Ok(SessionReconciler::new(
        Arc::new(store),
        Arc::new(remote),
        config.user.id.clone(),
        config.chat.clone(),
    ))
}

/// Render epoch milliseconds in local time
pub fn format_millis(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}

fn print_status_line(status: AgentStatus) {
    match status {
        AgentStatus::Connected => println!("Agent:  {}", "connected".green()),
        AgentStatus::Connecting => println!("Agent:  {}", "connecting".yellow()),
        AgentStatus::Error => println!(
            "Agent:  {} {}",
            "offline".red(),
            "(messages are kept locally)".dimmed()
        ),
    }
}

fn print_message(message: &ChatMessage) {
    let stamp = format_millis(message.timestamp).dimmed();
    match message.role {
        Role::User => println!("{} {}\n{}\n", "you".cyan().bold(), stamp, message.content),
        Role::Assistant => println!(
            "{} {}\n{}\n",
            "agent".green().bold(),
            stamp,
            message.content
        ),
    }
}

fn print_reply(reply: &str, mode: ReplyMode) {
    match mode {
        ReplyMode::Agent => println!("\n{}\n", reply),
        ReplyMode::Error => eprintln!("\n{}\n", reply.red()),
        ReplyMode::Offline => println!("\n{}\n", reply.yellow()),
    }
}

fn print_session_header(session: Option<&ChatSession>) {
    match session {
        Some(session) => println!(
            "Session: {} {}",
            session.title.bold(),
            format!("({})", session.id).dimmed()
        ),
        None => println!("Session: {}", "none".dimmed()),
    }
}

// Chat command handler
pub mod chat {
    //! Interactive chat handler.
    //!
    //! Reconciles sessions, then runs a readline loop where plain lines are
    //! sent to the agent and `/`-prefixed lines manage sessions.

    use super::special_commands::{parse_special_command, print_help, SpecialCommand};
    use super::*;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    /// Start interactive chat mode
    ///
    /// # Arguments
    ///
    /// * `config` - Loaded configuration
    /// * `session` - Session to open instead of the most recent one
    ///
    /// # Errors
    ///
    /// Returns error if the cache cannot be opened or the terminal cannot be
    /// read
    pub async fn run_chat(config: Config, session: Option<String>) -> Result<()> {
        let reconciler = build_reconciler(&config)?;
        let report = reconciler.initialize().await;
        print_welcome_banner(&report);

        if let Some(id) = session {
            if reconciler.select_session(&id).await.is_none() {
                println!("{}", format!("Session {} not found", id).yellow());
            }
        }
        print_session_header(reconciler.active_session().as_ref());
        for message in reconciler.active_messages() {
            print_message(&message);
        }

        let mut rl = DefaultEditor::new()?;

        loop {
            let prompt = format!("{} ", ">>".cyan().bold());
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(trimmed)?;

                    match parse_special_command(trimmed) {
                        Ok(SpecialCommand::None) => send_line(&reconciler, trimmed).await,
                        Ok(SpecialCommand::Exit) => break,
                        Ok(command) => handle_command(&reconciler, command).await,
                        Err(e) => eprintln!("{}", e.to_string().red()),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    async fn send_line(reconciler: &SessionReconciler, text: &str) {
        match reconciler.send_message(text).await {
            crate::reconciler::SendOutcome::Replied { reply, mode, .. } => {
                print_reply(&reply, mode)
            }
            crate::reconciler::SendOutcome::Ignored => {
                tracing::debug!("Message ignored");
            }
        }
    }

    async fn handle_command(reconciler: &SessionReconciler, command: SpecialCommand) {
        match command {
            SpecialCommand::NewSession(title) => {
                let session = reconciler.create_session(title.as_deref()).await;
                print_session_header(Some(&session));
            }
            SpecialCommand::ListSessions => {
                sessions::print_sessions(
                    &reconciler.sessions(),
                    reconciler.active_session_id().as_deref(),
                );
            }
            SpecialCommand::SelectSession(id) => match reconciler.select_session(&id).await {
                Some(messages) => {
                    print_session_header(reconciler.active_session().as_ref());
                    for message in &messages {
                        print_message(message);
                    }
                }
                None => println!("{}", format!("Session {} not found", id).yellow()),
            },
            SpecialCommand::DeleteSession(id) => {
                if reconciler.delete_session(&id).await {
                    println!("{}", format!("Deleted session {}", id).green());
                } else {
                    println!("{}", format!("Session {} not found", id).yellow());
                }
            }
            SpecialCommand::ShowStatus => {
                print_status_line(reconciler.status());
                print_session_header(reconciler.active_session().as_ref());
                println!("Sessions: {}", reconciler.sessions().len());
            }
            SpecialCommand::Help => print_help(),
            SpecialCommand::Exit | SpecialCommand::None => {}
        }
    }

    fn print_welcome_banner(report: &InitReport) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║              Justice Agent Chat - Bem-vindo!                 ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        print_status_line(report.status);
        println!(
            "Loaded {} remote and {} local-only sessions",
            report.remote_sessions, report.local_only_sessions
        );
        println!("Type '/help' for available commands, '/quit' to leave\n");
    }
}

// One-shot send handler
pub mod send {
    //! Send a single message without entering the interactive loop.

    use super::*;
    use crate::reconciler::SendOutcome;

    /// Send `text` and print the reply
    ///
    /// The reply is printed even when the agent is unreachable; the message
    /// stays in the local cache.
    pub async fn run_send(config: Config, text: String, session: Option<String>) -> Result<()> {
        let reconciler = build_reconciler(&config)?;
        reconciler.initialize().await;

        if let Some(id) = session {
            if reconciler.select_session(&id).await.is_none() {
                return Err(crate::error::JusticeSyncError::Config(format!(
                    "Session {} not found",
                    id
                ))
                .into());
            }
        }

        match reconciler.send_message(&text).await {
            SendOutcome::Replied {
                session_id,
                reply,
                mode,
            } => {
                tracing::debug!(session_id = %session_id, ?mode, "Message sent");
                print_reply(&reply, mode);
            }
            SendOutcome::Ignored => println!("{}", "Nothing to send".yellow()),
        }
        Ok(())
    }
}

// Agent health handler
pub mod health {
    //! Probe the Justice Agent.

    use super::*;
    use crate::error::JusticeSyncError;
    use crate::remote::SessionService;

    /// Print whether the agent is reachable; fails when it is not
    pub async fn check_health(config: &Config) -> Result<()> {
        let service = HttpSessionService::new(&config.agent)?;
        match service.health().await {
            Ok(()) => {
                println!(
                    "{} {}",
                    "Justice Agent is reachable at".green(),
                    config.agent.base_url
                );
                Ok(())
            }
            Err(e) => {
                eprintln!(
                    "{} {}: {}",
                    "Justice Agent is unreachable at".red(),
                    config.agent.base_url,
                    e
                );
                Err(JusticeSyncError::Remote(format!("Health check failed: {}", e)).into())
            }
        }
    }
}

// Model listing handler
pub mod models {
    //! Print the agent's model list as JSON.

    use super::*;
    use crate::remote::SessionService;

    /// Fetch and pretty-print `/v1/models`
    pub async fn list_models(config: &Config) -> Result<()> {
        let service = HttpSessionService::new(&config.agent)?;
        let models = service.list_models().await?;
        println!("{}", serde_json::to_string_pretty(&models)?);
        Ok(())
    }
}

// Search job watcher
pub mod searches {
    //! Watch document search jobs until they all finish.

    use super::*;
    use crate::search::{poll_searches, HttpSearchApi, SearchJob, SearchWatch};
    use prettytable::{format, Table};
    use std::time::Duration;

    /// Print search jobs, polling while any is still running
    pub async fn watch(config: &Config) -> Result<()> {
        let api = Arc::new(HttpSearchApi::new(&config.api, &config.agent)?);
        let period = Duration::from_secs(config.polling.interval_seconds);

        match poll_searches(api, period).await? {
            SearchWatch::Settled(jobs) => {
                print_jobs(&jobs);
                println!("{}", "All searches have finished.".green());
            }
            SearchWatch::Polling {
                initial,
                mut updates,
            } => {
                print_jobs(&initial);
                loop {
                    tokio::select! {
                        update = updates.next() => match update {
                            Some(jobs) => print_jobs(&jobs),
                            None => {
                                println!("{}", "All searches have finished.".green());
                                break;
                            }
                        },
                        _ = tokio::signal::ctrl_c() => {
                            updates.cancel();
                            println!("Stopped watching.");
                            break;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn print_jobs(jobs: &[SearchJob]) {
        if jobs.is_empty() {
            println!("{}", "No searches found.".yellow());
            return;
        }

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
        table.add_row(prettytable::row![
            "Document".bold(),
            "Created".bold(),
            "Status".bold(),
            "Progress".bold(),
            "Results".bold(),
            "Phase".bold()
        ]);

        for job in jobs {
            let status = match job.status {
                crate::search::SearchStatus::Completed => job.status.to_string().green(),
                crate::search::SearchStatus::Failed => job.status.to_string().red(),
                _ => job.status.to_string().yellow(),
            };
            table.add_row(prettytable::row![
                job.document.cyan(),
                job.created_at,
                status,
                format!("{:.0}%", job.progress),
                job.result_count,
                job.phase_message()
            ]);
        }

        println!();
        table.printstd();
        println!();
    }
}
