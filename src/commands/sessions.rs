use crate::cli::SessionCommand;
use crate::commands::{build_reconciler, format_millis};
use crate::config::Config;
use crate::error::Result;
use crate::session::ChatSession;
use colored::Colorize;
use prettytable::{format, Table};

/// Handle session management commands
pub async fn handle_sessions(config: &Config, command: SessionCommand) -> Result<()> {
    let reconciler = build_reconciler(config)?;
    reconciler.initialize().await;

    match command {
        SessionCommand::List => {
            print_sessions(
                &reconciler.sessions(),
                reconciler.active_session_id().as_deref(),
            );
            println!(
                "Use {} to open a session.",
                "justice-sync chat --session <ID>".cyan()
            );
            println!();
        }
        SessionCommand::Delete { id } => {
            if reconciler.delete_session(&id).await {
                println!("{}", format!("Deleted session {}", id).green());
            } else {
                println!("{}", format!("Session {} not found", id).yellow());
            }
        }
    }

    Ok(())
}

/// Print sessions as a table, marking the active one
pub fn print_sessions(sessions: &[ChatSession], active: Option<&str>) {
    if sessions.is_empty() {
        println!("{}", "No sessions found.".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "".bold(),
        "ID".bold(),
        "Title".bold(),
        "Messages".bold(),
        "Last Activity".bold(),
        "Origin".bold()
    ]);

    for session in sessions {
        let marker = if Some(session.id.as_str()) == active {
            "*"
        } else {
            ""
        };
        let origin = if session.is_local_only() {
            "local".yellow()
        } else {
            "agent".green()
        };

        table.add_row(prettytable::row![
            marker,
            session.id.cyan(),
            truncate_title(&session.title, 40),
            session.messages.len(),
            format_millis(session.last_activity),
            origin
        ]);
    }

    println!("\nSessions:");
    table.printstd();
    println!();
}

fn truncate_title(title: &str, max_chars: usize) -> String {
    if title.chars().count() > max_chars {
        let head: String = title.chars().take(max_chars - 3).collect();
        format!("{}...", head)
    } else {
        title.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_title_counts_chars() {
        assert_eq!(truncate_title("Ação", 40), "Ação");
        let long = "é".repeat(50);
        let truncated = truncate_title(&long, 40);
        assert_eq!(truncated.chars().count(), 40);
        assert!(truncated.ends_with("..."));
    }
}
