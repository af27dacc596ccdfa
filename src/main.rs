//! Justice Sync - offline-tolerant Justice Agent client
//!
#![doc = "Justice Sync - offline-tolerant Justice Agent client"]
#![doc = "Main entry point for the justice-sync command line tool."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use justice_sync::cli::{Cli, Commands, SearchCommand};
use justice_sync::commands;
use justice_sync::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose, cli.json_logs);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat { session } => {
            tracing::info!("Starting interactive chat mode");
            if let Some(id) = &session {
                tracing::debug!("Opening session: {}", id);
            }
            commands::chat::run_chat(config, session).await?;
            Ok(())
        }
        Commands::Send { text, session } => {
            tracing::info!("Sending a single message");
            commands::send::run_send(config, text, session).await?;
            Ok(())
        }
        Commands::Sessions { command } => {
            tracing::info!("Starting session command");
            commands::sessions::handle_sessions(&config, command).await?;
            Ok(())
        }
        Commands::Health => {
            commands::health::check_health(&config).await?;
            Ok(())
        }
        Commands::Models => {
            commands::models::list_models(&config).await?;
            Ok(())
        }
        Commands::Searches { command } => match command {
            SearchCommand::Watch => {
                tracing::info!("Watching search jobs");
                commands::searches::watch(&config).await?;
                Ok(())
            }
        },
    }
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins over `--verbose`. Logs go to stderr so command output
/// stays clean on stdout.
fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose {
        "justice_sync=debug"
    } else {
        "justice_sync=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
