//! Special commands parser for interactive chat mode
//!
//! Special commands manage sessions during an interactive chat instead of
//! being sent to the agent:
//! - Start, list, select and delete sessions
//! - View the agent connection status
//! - Display help information
//! - Exit the session
//!
//! Commands are prefixed with `/` and are case-insensitive. Session ids keep
//! their original case.

use colored::Colorize;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Start a new session, optionally titled
    NewSession(Option<String>),

    /// List sessions, most recent first
    ListSessions,

    /// Switch to another session by id
    SelectSession(String),

    /// Delete a session by id
    DeleteSession(String),

    /// Display the agent status and active session
    ShowStatus,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be sent to the agent as a message.
    None,
}

/// Parse user input into a special command
///
/// Returns [`SpecialCommand::None`] for plain messages.
///
/// # Errors
///
/// Returns [`CommandError`] for unknown commands or missing arguments
///
/// # Examples
///
/// ```
/// use justice_sync::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/list").unwrap(), SpecialCommand::ListSessions);
/// assert_eq!(
///     parse_special_command("/select AbC-1").unwrap(),
///     SpecialCommand::SelectSession("AbC-1".to_string())
/// );
/// assert_eq!(parse_special_command("Olá").unwrap(), SpecialCommand::None);
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    let (command, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((command, arg)) => (command.to_lowercase(), Some(arg.trim())),
        None => (lower.clone(), None),
    };
    let arg = arg.filter(|a| !a.is_empty());

    match command.as_str() {
        "/new" => Ok(SpecialCommand::NewSession(arg.map(str::to_string))),
        "/list" | "/sessions" => Ok(SpecialCommand::ListSessions),
        "/select" | "/open" => arg
            .map(|id| SpecialCommand::SelectSession(id.to_string()))
            .ok_or_else(|| CommandError::MissingArgument {
                command: "/select".to_string(),
                usage: "/select <session-id>".to_string(),
            }),
        "/delete" => arg
            .map(|id| SpecialCommand::DeleteSession(id.to_string()))
            .ok_or_else(|| CommandError::MissingArgument {
                command: "/delete".to_string(),
                usage: "/delete <session-id>".to_string(),
            }),
        "/status" => Ok(SpecialCommand::ShowStatus),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/quit" | "/exit" | "quit" | "exit" => Ok(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

/// Print help for the special commands
pub fn print_help() {
    println!("\n{}", "Chat commands".bold());
    println!("  {}            Start a new session", "/new [title]".cyan());
    println!("  {}                List sessions", "/list".cyan());
    println!("  {}      Switch to a session", "/select <id>".cyan());
    println!("  {}      Delete a session", "/delete <id>".cyan());
    println!("  {}              Show agent status", "/status".cyan());
    println!("  {}                Show this help", "/help".cyan());
    println!("  {}                Leave the chat", "/quit".cyan());
    println!("\nAnything else is sent to the Justice Agent.\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(
            parse_special_command("Qual o prazo?").unwrap(),
            SpecialCommand::None
        );
    }

    #[test]
    fn test_parse_new_with_and_without_title() {
        assert_eq!(
            parse_special_command("/new").unwrap(),
            SpecialCommand::NewSession(None)
        );
        assert_eq!(
            parse_special_command("/NEW  Recurso Especial ").unwrap(),
            SpecialCommand::NewSession(Some("Recurso Especial".to_string()))
        );
    }

    #[test]
    fn test_parse_list_aliases() {
        assert_eq!(
            parse_special_command("/list").unwrap(),
            SpecialCommand::ListSessions
        );
        assert_eq!(
            parse_special_command("/sessions").unwrap(),
            SpecialCommand::ListSessions
        );
    }

    #[test]
    fn test_parse_select_keeps_id_case() {
        assert_eq!(
            parse_special_command("/Select 01HXYZ").unwrap(),
            SpecialCommand::SelectSession("01HXYZ".to_string())
        );
    }

    #[test]
    fn test_parse_select_without_id_fails() {
        let err = parse_special_command("/select").unwrap_err();
        assert!(matches!(err, CommandError::MissingArgument { .. }));
        assert!(err.to_string().contains("/select <session-id>"));
    }

    #[test]
    fn test_parse_delete() {
        assert_eq!(
            parse_special_command("/delete local-1700000000000").unwrap(),
            SpecialCommand::DeleteSession("local-1700000000000".to_string())
        );
        assert!(parse_special_command("/delete   ").is_err());
    }

    #[test]
    fn test_parse_exit_variants() {
        for input in ["/quit", "/exit", "exit", "QUIT"] {
            assert_eq!(parse_special_command(input).unwrap(), SpecialCommand::Exit);
        }
    }

    #[test]
    fn test_parse_status_and_help() {
        assert_eq!(
            parse_special_command("/status").unwrap(),
            SpecialCommand::ShowStatus
        );
        assert_eq!(parse_special_command("/?").unwrap(), SpecialCommand::Help);
    }

    #[test]
    fn test_unknown_command() {
        let err = parse_special_command("/frobnicate").unwrap_err();
        assert_eq!(err, CommandError::UnknownCommand("/frobnicate".to_string()));
    }
}
