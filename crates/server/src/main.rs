//! Lectern CLI
//!
//! Main entry point for the lectern command-line tool.
//! Runs the HTTP server and provides administrative commands for accounts
//! and course materials.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AccountsCommand, AskCommand, MaterialsCommand, ServeCommand};
use lectern_core::{config::AppConfig, logging, AppResult, EnvSecrets};
use std::path::PathBuf;
use tracing::Instrument;

/// Lectern - course materials with AI question answering
#[derive(Parser, Debug)]
#[command(name = "lectern")]
#[command(about = "Course materials with AI question answering", long_about = None)]
#[command(version)]
struct Cli {
    /// Data directory (database, stored files, prompt overrides)
    #[arg(short, long, global = true, env = "LECTERN_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "LECTERN_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Generation provider (gemini, ollama)
    #[arg(short, long, global = true, env = "LECTERN_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "LECTERN_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server
    Serve(ServeCommand),

    /// Ask a question about a material
    Ask(AskCommand),

    /// Manage course materials
    Materials(MaterialsCommand),

    /// Manage teacher accounts and student enrollment codes
    Accounts(AccountsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load configuration, letting explicit paths pick the config file
    let config = AppConfig::load_with_paths(&EnvSecrets, cli.data_dir, cli.config)?;

    // Apply CLI overrides
    let config = config.with_overrides(
        None,
        None,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_json)?;

    tracing::info!("Lectern starting");
    tracing::debug!("Data dir: {:?}", config.data_dir);
    tracing::debug!("Provider: {}", config.generation.provider);
    tracing::debug!("Model: {}", config.generation.model);

    config.validate()?;
    config.ensure_data_dir()?;

    let command_name = match &cli.command {
        Commands::Serve(_) => "serve",
        Commands::Ask(_) => "ask",
        Commands::Materials(_) => "materials",
        Commands::Accounts(_) => "accounts",
    };

    // Route to command handlers inside the command span
    let result = async {
        tracing::info!("Command started");
        match cli.command {
            Commands::Serve(cmd) => cmd.execute(&config).await,
            Commands::Ask(cmd) => cmd.execute(&config).await,
            Commands::Materials(cmd) => cmd.execute(&config).await,
            Commands::Accounts(cmd) => cmd.execute(&config),
        }
    }
    .instrument(tracing::info_span!("command", name = command_name))
    .await;

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
