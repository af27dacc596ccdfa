//! Command-line interface definition for Justice Sync
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for chatting with the Justice Agent, managing
//! sessions and watching search jobs.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Justice Sync - offline-tolerant client for the Justice Agent
///
/// Keeps a local cache of chat sessions reconciled with the agent's
/// server-side sessions.
#[derive(Parser, Debug, Clone)]
#[command(name = "justice-sync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Path of the local session cache database
    #[arg(long, global = true, env = "JUSTICE_SYNC_CACHE_DB")]
    pub cache_path: Option<PathBuf>,

    /// User id to reconcile sessions for
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Justice Sync
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat with the agent
    Chat {
        /// Session to open instead of the most recent one
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Send a single message and print the reply
    Send {
        /// Message text
        text: String,

        /// Session to send to instead of the most recent one
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Manage chat sessions
    Sessions {
        /// Session management subcommand
        #[command(subcommand)]
        command: SessionCommand,
    },

    /// Check whether the agent is reachable
    Health,

    /// List the models the agent can use
    Models,

    /// Work with document search jobs
    Searches {
        /// Search subcommand
        #[command(subcommand)]
        command: SearchCommand,
    },
}

/// Session management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// List reconciled sessions, newest first
    List,

    /// Delete a session locally and on the agent
    Delete {
        /// Session id
        id: String,
    },
}

/// Search job subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SearchCommand {
    /// Poll search jobs until every job has finished
    Watch,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            json_logs: false,
            cache_path: None,
            user: None,
            command: Commands::Health,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert!(cli.user.is_none());
    }

    #[test]
    fn test_cli_parse_chat_command() {
        let cli = Cli::try_parse_from(["justice-sync", "chat"]).unwrap();
        assert!(matches!(cli.command, Commands::Chat { session: None }));
    }

    #[test]
    fn test_cli_parse_chat_with_session() {
        let cli = Cli::try_parse_from(["justice-sync", "chat", "--session", "abc"]).unwrap();
        match cli.command {
            Commands::Chat { session } => assert_eq!(session.as_deref(), Some("abc")),
            _ => panic!("Expected Chat command"),
        }
    }

    #[test]
    fn test_cli_parse_send() {
        let cli = Cli::try_parse_from(["justice-sync", "send", "Olá"]).unwrap();
        match cli.command {
            Commands::Send { text, session } => {
                assert_eq!(text, "Olá");
                assert!(session.is_none());
            }
            _ => panic!("Expected Send command"),
        }
    }

    #[test]
    fn test_cli_parse_send_requires_text() {
        assert!(Cli::try_parse_from(["justice-sync", "send"]).is_err());
    }

    #[test]
    fn test_cli_parse_sessions_list_and_delete() {
        let cli = Cli::try_parse_from(["justice-sync", "sessions", "list"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Sessions {
                command: SessionCommand::List
            }
        ));

        let cli = Cli::try_parse_from(["justice-sync", "sessions", "delete", "s1"]).unwrap();
        match cli.command {
            Commands::Sessions {
                command: SessionCommand::Delete { id },
            } => assert_eq!(id, "s1"),
            _ => panic!("Expected Sessions Delete command"),
        }
    }

    #[test]
    fn test_cli_parse_searches_watch() {
        let cli = Cli::try_parse_from(["justice-sync", "searches", "watch"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Searches {
                command: SearchCommand::Watch
            }
        ));
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "justice-sync",
            "health",
            "--verbose",
            "--json-logs",
            "--user",
            "ana",
            "--cache-path",
            "/tmp/cache.db",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(cli.json_logs);
        assert_eq!(cli.user.as_deref(), Some("ana"));
        assert_eq!(cli.cache_path, Some(PathBuf::from("/tmp/cache.db")));
    }

    #[test]
    fn test_cli_custom_config() {
        let cli =
            Cli::try_parse_from(["justice-sync", "--config", "custom.yaml", "models"]).unwrap();
        assert_eq!(cli.config, Some("custom.yaml".to_string()));
        assert!(matches!(cli.command, Commands::Models));
    }

    #[test]
    fn test_cli_invalid_command() {
        assert!(Cli::try_parse_from(["justice-sync", "invalid"]).is_err());
    }
}
