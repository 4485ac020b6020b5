//! medfaq CLI
//!
//! Main entry point for the medfaq command-line tool.
//! Answers questions about medical FAQ datasets with retrieval-augmented
//! generation over a local vector index.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, DatasetsCommand, ImportCommand, StatsCommand};
use medfaq_core::{config::AppConfig, logging, ApiKey, AppResult};
use std::path::PathBuf;

/// medfaq - ask questions about Taiwan MOHW medical FAQ datasets
#[derive(Parser, Debug)]
#[command(name = "medfaq")]
#[command(about = "Retrieval-augmented chat over medical FAQ datasets", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "MEDFAQ_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "MEDFAQ_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Answer backend provider (openai, ollama)
    #[arg(short, long, global = true, env = "MEDFAQ_PROVIDER")]
    provider: Option<String>,

    /// Answer model identifier
    #[arg(short, long, global = true, env = "MEDFAQ_MODEL")]
    model: Option<String>,

    /// API key for the session (never stored)
    #[arg(long, global = true, env = "MEDFAQ_API_KEY", hide_env_values = true)]
    api_key: Option<ApiKey>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a single question
    Ask(AskCommand),

    /// Interactive chat session
    Chat(ChatCommand),

    /// List the available datasets
    Datasets(DatasetsCommand),

    /// Import FAQ records into the vector index
    Import(ImportCommand),

    /// Show vector index statistics
    Stats(StatsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load configuration; CLI flags decide which workspace and file are read
    let config = AppConfig::load_with(cli.workspace, cli.config)?.with_overrides(
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    config.validate()?;

    tracing::info!("medfaq CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {} ({})", config.llm.provider, config.llm.model);
    tracing::debug!(
        "Embedding provider: {} ({})",
        config.embedding.provider,
        config.embedding.model
    );

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Chat(_) => "chat",
        Commands::Datasets(_) => "datasets",
        Commands::Import(_) => "import",
        Commands::Stats(_) => "stats",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let api_key = cli.api_key.filter(|k| !k.is_blank());

    // Route to command handlers
    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config, api_key.as_ref()).await,
        Commands::Chat(cmd) => cmd.execute(&config, api_key).await,
        Commands::Datasets(cmd) => cmd.execute(&config),
        Commands::Import(cmd) => cmd.execute(&config, api_key.as_ref()).await,
        Commands::Stats(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask_with_key() {
        let cli = Cli::try_parse_from([
            "medfaq",
            "--api-key",
            "sk-secret",
            "ask",
            "--dataset",
            "經痛",
            "經痛可以熱敷嗎？",
        ])
        .unwrap();

        assert_eq!(cli.api_key.as_ref().map(ApiKey::expose), Some("sk-secret"));
        assert!(!format!("{:?}", cli).contains("sk-secret"));
        match cli.command {
            Commands::Ask(cmd) => {
                assert_eq!(cmd.dataset.as_deref(), Some("經痛"));
                assert_eq!(cmd.question, "經痛可以熱敷嗎？");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_import() {
        let cli = Cli::try_parse_from(["medfaq", "import", "--reset", "a.jsonl", "data/"]).unwrap();
        match cli.command {
            Commands::Import(cmd) => {
                assert!(cmd.reset);
                assert_eq!(cmd.paths.len(), 2);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_import_requires_paths() {
        assert!(Cli::try_parse_from(["medfaq", "import"]).is_err());
    }
}
