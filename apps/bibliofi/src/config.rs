//! # Configuration
//!
//! Bootstrap settings for the bot process, read from a TOML file with
//! environment and CLI overrides for the token. The file is optional: a
//! missing file yields the defaults and the token can still come from
//! `BIBLIOFI_TOKEN`.
//!
//! ```toml
//! token = "123456:ABC-DEF"
//! api_url = "https://api.telegram.org"
//! log_file = "bibliofi.log"
//! poll_timeout_secs = 30
//! ```

use crate::bot::DEFAULT_API_URL;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding the configured token.
pub const TOKEN_ENV_VAR: &str = "BIBLIOFI_TOKEN";

const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration file: {0}")]
    Io(String),

    #[error("configuration file is not valid TOML: {0}")]
    Parse(String),

    #[error(
        "no bot token configured: pass --token, set {TOKEN_ENV_VAR}, \
         or put `token` in the config file"
    )]
    MissingToken,
}

// =============================================================================
// CONFIG
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Bot API token; optional here because the env/CLI may provide it.
    pub token: Option<String>,

    /// Bot API host, overridable for tests and proxies.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// If set, log lines are appended to this file as well as the console.
    pub log_file: Option<PathBuf>,

    /// Long-poll wait passed to the transport.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: None,
            api_url: default_api_url(),
            log_file: None,
            poll_timeout_secs: default_poll_timeout(),
        }
    }
}

impl Config {
    /// Read the file at `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::Io(e.to_string())),
        }
    }

    /// The token to run with: CLI override, then environment, then file.
    pub fn resolved_token(&self, cli_override: Option<String>) -> Result<String, ConfigError> {
        cli_override
            .or_else(|| std::env::var(TOKEN_ENV_VAR).ok())
            .or_else(|| self.token.clone())
            .ok_or(ConfigError::MissingToken)
    }

    #[must_use]
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_poll_timeout() -> u64 {
    DEFAULT_POLL_TIMEOUT_SECS
}

// =============================================================================
// TESTS
// =============================================================================
