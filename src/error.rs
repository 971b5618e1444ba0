//! Library error type.
//!
//! CLI commands and binaries wrap these in `anyhow`; library code returns
//! `error::Result` so callers can match on the failure kind.

use thiserror::Error;

/// Errors produced by the bot library.
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Airtable API error ({status}): {message}")]
    AirtableApi { status: u16, message: String },

    #[error("Telegram API error: {0}")]
    Telegram(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Participant not found: {0}")]
    NotFound(String),

    #[error("Another instance is already running (lock file: {0})")]
    AlreadyRunning(String),
}

impl BotError {
    /// Whether a request that failed with this error is worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            BotError::AirtableApi { status, .. } => *status == 429 || *status >= 500,
            BotError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
