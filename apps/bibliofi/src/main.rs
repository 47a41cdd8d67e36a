//! # bibliofi - THE BINARY
//!
//! The bot process: configuration, logging bootstrap, and the CLI entry
//! point.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  apps/bibliofi (THE BINARY)              │
//! │                                                          │
//! │  ┌──────────┐   ┌─────────────┐   ┌──────────────────┐  │
//! │  │   CLI    │   │ Dispatcher  │   │  TelegramApi     │  │
//! │  │  (clap)  │   │ + Sessions  │   │  (reqwest)       │  │
//! │  └────┬─────┘   └──────┬──────┘   └────────┬─────────┘  │
//! │       │                │                   │             │
//! │       └────────────────┼───────────────────┘             │
//! │                        ▼                                 │
//! │                ┌───────────────┐                         │
//! │                │ bibliofi-core │                         │
//! │                │  (THE LOGIC)  │                         │
//! │                └───────────────┘                         │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the bot (token from bibliofi.toml or BIBLIOFI_TOKEN)
//! bibliofi run
//!
//! # Validate a dataset file without the network
//! bibliofi check --file wifi-library.csv
//! ```

use bibliofi::cli;
use bibliofi::config::Config;
use clap::Parser;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(2);
        }
    };

    init_tracing(config.log_file.as_deref());

    if let Err(e) = cli::execute(cli, config).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing — BIBLIOFI_LOG_FORMAT=json enables machine-parseable
/// console output; `log_file` adds a plain-text append layer, so the log
/// lands on the console and in the file simultaneously.
fn init_tracing(log_file: Option<&Path>) {
    let log_format = std::env::var("BIBLIOFI_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bibliofi=info".into());

    let file_layer = log_file.and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            ),
            Err(e) => {
                eprintln!("cannot open log file {}: {e}", path.display());
                None
            }
        }
    });

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);

    match log_format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry.with(tracing_subscriber::fmt::layer()).init();
        }
    }
}
