//! # bibliofi CLI Module
//!
//! The command-line surface of the binary.
//!
//! ## Available Commands
//!
//! - `run` - start the bot (default when no subcommand is given)
//! - `check` - decode a dataset file offline and report the outcome
//!
//! `check` exercises exactly the codec path an upload would take, so a file
//! can be validated before sending it to the bot.

use crate::bot::{Dispatcher, TelegramApi, TransportError};
use crate::config::{Config, ConfigError};
use crate::store::SessionStore;
use bibliofi_core::Encoding;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// bibliofi - a Telegram bot for the wifi-library dataset.
///
/// Upload a CSV or JSON dataset in chat, filter or sort it with commands,
/// and download the result in either format.
#[derive(Parser, Debug)]
#[command(name = "bibliofi")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true, default_value = "bibliofi.toml")]
    pub config: PathBuf,

    /// Bot API token (overrides the config file and BIBLIOFI_TOKEN)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the bot and poll for updates until interrupted
    Run,

    /// Decode a dataset file offline and report record count or the error
    Check {
        /// Path to the .csv or .json file to validate
        #[arg(short, long)]
        file: PathBuf,
    },
}

// =============================================================================
// ERRORS
// =============================================================================

/// Top-level failures of the binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("cannot read {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("unsupported file extension (expected .csv or .json)")]
    UnsupportedFile,

    #[error(transparent)]
    Dataset(#[from] bibliofi_core::FormatError),
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments and loaded configuration.
pub async fn execute(cli: Cli, config: Config) -> Result<(), AppError> {
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_bot(cli.token, &config).await,
        Commands::Check { file } => check_file(&file),
    }
}

/// Wire the transport, store and dispatcher together and poll until Ctrl-C.
async fn run_bot(token_override: Option<String>, config: &Config) -> Result<(), AppError> {
    let token = config.resolved_token(token_override)?;
    let transport = Arc::new(TelegramApi::new(&config.api_url, &token));
    let store = Arc::new(SessionStore::new());
    let cancel = CancellationToken::new();

    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            signal_cancel.cancel();
        }
    });

    Dispatcher::new(transport, store)
        .run(cancel, config.poll_timeout())
        .await?;
    Ok(())
}

/// Decode `path` with the codec its extension names.
fn check_file(path: &Path) -> Result<(), AppError> {
    let encoding = path
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(Encoding::from_file_name)
        .ok_or(AppError::UnsupportedFile)?;
    let bytes = std::fs::read(path).map_err(|e| AppError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let records = encoding.codec().decode(&bytes)?;
    println!("{}: OK, {} records", path.display(), records.len());
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use bibliofi_core::{CSV_HEADER_FIELDS, CSV_HEADER_LABELS};
    use std::io::Write as _;

    #[test]
    fn check_accepts_a_valid_dataset() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("wifi.csv");
        let mut file = std::fs::File::create(&path).expect("create");
        writeln!(file, "{CSV_HEADER_FIELDS}").expect("write");
        writeln!(file, "{CSV_HEADER_LABELS}").expect("write");
        writeln!(
            file,
            "\"1\";\"Лермонтовка\";\"ЦАО\";\"Басманный\";\"ул. Бауманская, 58\";\"2\";\"MosGorLib\";\"20\";\"действует\";\"открытая сеть\";\"\";\"55.77\";\"37.68\";\"281129\";\"\";\"\";"
        )
        .expect("write");

        assert!(check_file(&path).is_ok());
    }

    #[test]
    fn check_rejects_a_foreign_header() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("other.csv");
        std::fs::write(&path, "a;b;c\n").expect("write");
        assert!(matches!(check_file(&path), Err(AppError::Dataset(_))));
    }

    #[test]
    fn check_rejects_unknown_extensions() {
        assert!(matches!(
            check_file(Path::new("data.parquet")),
            Err(AppError::UnsupportedFile)
        ));
    }

    #[test]
    fn run_is_the_default_subcommand() {
        let cli = Cli::parse_from(["bibliofi"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from("bibliofi.toml"));
    }

    #[test]
    fn check_subcommand_parses_its_file() {
        let cli = Cli::parse_from(["bibliofi", "check", "--file", "wifi.json"]);
        match cli.command {
            Some(Commands::Check { file }) => assert_eq!(file, PathBuf::from("wifi.json")),
            other => unreachable!("unexpected command: {other:?}"),
        }
    }
}
