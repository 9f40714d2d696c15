use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sgs_rag::Result;
use sgs_rag::commands::{run_chat, run_ingest, run_setup, show_status};
use sgs_rag::config::Config;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, filter::LevelFilter};

#[derive(Parser)]
#[command(name = "sgs-rag")]
#[command(about = "Document ingestion and retrieval-augmented chat over a school archive")]
#[command(version)]
struct Cli {
    /// Path to an optional TOML settings file
    #[arg(long, default_value = "rag.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create tables, enable the vector extension, and build indexes
    Setup,
    /// Process the configured document directories into the vector store
    Ingest,
    /// Start the interactive question answering loop
    Chat,
    /// Show connectivity and ingestion status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    // The ingest run additionally appends INFO and above to the log file.
    let _guard = init_tracing(&config, matches!(cli.command, Commands::Ingest));

    match cli.command {
        Commands::Setup => {
            run_setup().await?;
        }
        Commands::Ingest => {
            run_ingest(&config).await?;
        }
        Commands::Chat => {
            run_chat(&config).await?;
        }
        Commands::Status => {
            show_status(&config).await?;
        }
    }

    Ok(())
}

fn init_tracing(config: &Config, log_to_file: bool) -> Option<WorkerGuard> {
    if !log_to_file {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .init();
        return None;
    }

    let directory = config
        .log_file
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
    let file_name = config
        .log_file
        .file_name()
        .unwrap_or_else(|| std::ffi::OsStr::new("document_processing.log"));

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(EnvFilter::from_default_env()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(LevelFilter::INFO),
        )
        .init();

    Some(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn cli_parsing() {
        let cli = Cli::try_parse_from(["sgs-rag", "setup"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            matches!(parsed.command, Commands::Setup);
        }
    }

    #[test]
    fn ingest_command() {
        let cli = Cli::try_parse_from(["sgs-rag", "ingest"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            matches!(parsed.command, Commands::Ingest);
        }
    }

    #[test]
    fn chat_command_with_config_path() {
        let cli = Cli::try_parse_from(["sgs-rag", "--config", "custom.toml", "chat"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            assert_eq!(parsed.config, PathBuf::from("custom.toml"));
            matches!(parsed.command, Commands::Chat);
        }
    }

    #[test]
    fn default_config_path() {
        let cli = Cli::try_parse_from(["sgs-rag", "status"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            assert_eq!(parsed.config, PathBuf::from("rag.toml"));
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["sgs-rag", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["sgs-rag", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
