//! db-chat - ask a SQL database questions in natural language.

use db_chat::app::Orchestrator;
use db_chat::cli::Cli;
use db_chat::config::{Config, ConnectionConfig};
use db_chat::error::{ChatError, Result};
use db_chat::{logging, tui};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Ignore a missing .env file.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();

    if cli.ask.is_some() {
        logging::init_stderr_logging();
    } else {
        logging::init_file_logging();
    }

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.category(), e);
        eprintln!("{}: {}", e.category(), e.message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    cli.apply_overrides(&mut config)?;

    let connection = resolve_connection(&cli, &config)?.ok_or_else(|| {
        ChatError::config(
            "No database connection configured. Pass a connection string, use -c, \
             or set DB_HOST/DB_NAME/DB_USER. See --help.",
        )
    })?;
    info!("Connection: {}", connection.display_string());

    let orchestrator = Orchestrator::from_config(&config, &connection).await?;
    info!(
        "Ready ({} provider, {} mode)",
        config.llm.provider,
        orchestrator.mode().as_str()
    );

    match &cli.ask {
        Some(question) => {
            let answer = orchestrator.process(question).await;
            println!("{answer}");
            if let Err(e) = orchestrator.close().await {
                warn!("Error closing database connection: {}", e);
            }
            Ok(())
        }
        None => tui::run(orchestrator, Some(connection.display_string())).await,
    }
}

/// Resolves the final connection configuration from CLI args, config file, and environment.
///
/// Precedence: CLI arguments, then the named connection, then the default
/// connection, then `DB_*` environment variables for whatever is still unset.
fn resolve_connection(cli: &Cli, config: &Config) -> Result<Option<ConnectionConfig>> {
    let mut connection = cli.to_connection_config()?;

    if connection.is_none() {
        if let Some(name) = cli.connection_name() {
            connection = config.get_connection(Some(name)).cloned();
            if connection.is_none() {
                return Err(ChatError::config(format!(
                    "Connection '{}' not found in config file",
                    name
                )));
            }
        }
    }

    if connection.is_none() {
        connection = config.get_connection(None).cloned();
    }

    // With nothing configured, the environment alone may describe a connection.
    if connection.is_none() && std::env::var("DB_NAME").is_ok() {
        connection = Some(ConnectionConfig::default());
    }

    if let Some(ref mut conn) = connection {
        conn.apply_env_defaults();
    }

    Ok(connection)
}
