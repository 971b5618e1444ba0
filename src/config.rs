//! Settings loaded from environment variables and an optional `.env` file.
//!
//! Process environment wins over the file. The file is read from
//! `ROSTER_BOT_ENV_FILE` if set, else `./.env`.

use chrono::{FixedOffset, NaiveTime};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{BotError, Result};
use crate::search::ranker::{DEFAULT_SEARCH_LIMIT, DEFAULT_SEARCH_THRESHOLD};
use crate::search::SearchOptions;

pub const DEFAULT_PARTICIPANTS_TABLE: &str = "Participants";
pub const DEFAULT_SCHEDULE_TABLE: &str = "Schedule";
pub const DEFAULT_NOTIFY_TIME: &str = "20:00";
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 3;
pub const DEFAULT_SCHEDULE_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_SESSION_TIMEOUT_MINUTES: i64 = 30;

/// Runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Only the bot needs it; CLI commands work without.
    pub telegram_token: Option<String>,
    pub airtable_token: String,
    pub airtable_base_id: String,
    pub participants_table: String,
    pub schedule_table: String,
    /// Telegram user ids allowed to use the bot; empty allows everyone.
    pub allowed_user_ids: Vec<i64>,
    /// Chats receiving the daily statistics message.
    pub notify_chat_ids: Vec<i64>,
    pub notify_time: NaiveTime,
    pub utc_offset: FixedOffset,
    pub search: SearchOptions,
    pub schedule_cache_ttl: Duration,
    pub session_timeout: chrono::Duration,
    pub lock_file: PathBuf,
    pub pid_file: PathBuf,
}

impl Settings {
    /// Load from the process environment plus `.env`.
    pub fn from_env() -> Result<Self> {
        let file_path = std::env::var("ROSTER_BOT_ENV_FILE").unwrap_or_else(|_| ".env".to_string());
        let file_vars = parse_env_file(Path::new(&file_path))?;
        Self::from_lookup(|key| std::env::var(key).ok().or_else(|| file_vars.get(key).cloned()))
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| BotError::Config(format!("{} is not set", key)))
        };

        let notify_time_raw = get("NOTIFY_TIME").unwrap_or_else(|| DEFAULT_NOTIFY_TIME.to_string());
        let notify_time = NaiveTime::parse_from_str(&notify_time_raw, "%H:%M").map_err(|_| {
            BotError::Config(format!("NOTIFY_TIME must be HH:MM, got '{}'", notify_time_raw))
        })?;

        let offset_hours: i32 = parse_or("UTC_OFFSET_HOURS", get("UTC_OFFSET_HOURS"), DEFAULT_UTC_OFFSET_HOURS)?;
        let utc_offset = offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| BotError::Config(format!("UTC_OFFSET_HOURS out of range: {}", offset_hours)))?;

        let threshold: f64 = parse_or("SEARCH_THRESHOLD", get("SEARCH_THRESHOLD"), DEFAULT_SEARCH_THRESHOLD)?;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(BotError::Config(format!(
                "SEARCH_THRESHOLD must be within 0..1, got {}",
                threshold
            )));
        }
        let limit: usize = parse_or("SEARCH_LIMIT", get("SEARCH_LIMIT"), DEFAULT_SEARCH_LIMIT)?;

        let ttl_secs: u64 = parse_or(
            "SCHEDULE_CACHE_TTL_SECS",
            get("SCHEDULE_CACHE_TTL_SECS"),
            DEFAULT_SCHEDULE_CACHE_TTL_SECS,
        )?;
        let session_minutes: i64 = parse_or(
            "SESSION_TIMEOUT_MINUTES",
            get("SESSION_TIMEOUT_MINUTES"),
            DEFAULT_SESSION_TIMEOUT_MINUTES,
        )?;
        let session_timeout = chrono::Duration::try_minutes(session_minutes)
            .filter(|d| *d > chrono::Duration::zero())
            .ok_or_else(|| {
                BotError::Config(format!("SESSION_TIMEOUT_MINUTES out of range: {}", session_minutes))
            })?;

        Ok(Self {
            telegram_token: get("TELEGRAM_BOT_TOKEN"),
            airtable_token: required("AIRTABLE_TOKEN")?,
            airtable_base_id: required("AIRTABLE_BASE_ID")?,
            participants_table: get("AIRTABLE_PARTICIPANTS_TABLE")
                .unwrap_or_else(|| DEFAULT_PARTICIPANTS_TABLE.to_string()),
            schedule_table: get("AIRTABLE_SCHEDULE_TABLE")
                .unwrap_or_else(|| DEFAULT_SCHEDULE_TABLE.to_string()),
            allowed_user_ids: parse_id_list("ALLOWED_USER_IDS", get("ALLOWED_USER_IDS"))?,
            notify_chat_ids: parse_id_list("NOTIFY_CHAT_IDS", get("NOTIFY_CHAT_IDS"))?,
            notify_time,
            utc_offset,
            search: SearchOptions::new(threshold, limit),
            schedule_cache_ttl: Duration::from_secs(ttl_secs),
            session_timeout,
            lock_file: get("LOCK_FILE")
                .map(|p| expand_path(&p))
                .unwrap_or_else(|| state_dir().join("bot.lock")),
            pid_file: get("PID_FILE")
                .map(|p| expand_path(&p))
                .unwrap_or_else(|| state_dir().join("bot.pid")),
        })
    }

    /// Bot token, or a config error when unset.
    pub fn telegram_token(&self) -> Result<&str> {
        self.telegram_token
            .as_deref()
            .ok_or_else(|| BotError::Config("TELEGRAM_BOT_TOKEN is not set".to_string()))
    }
}

/// Default directory for lock and pid files (`~/.roster-bot`).
pub fn state_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".roster-bot")
}

/// Expand a leading `~` in a configured path.
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).to_string())
}

fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        None => Ok(default),
        Some(v) => v
            .parse()
            .map_err(|_| BotError::Config(format!("{} has an invalid value: '{}'", key, v))),
    }
}

fn parse_id_list(key: &str, raw: Option<String>) -> Result<Vec<i64>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| BotError::Config(format!("{} contains a non-numeric id: '{}'", key, s)))
        })
        .collect()
}

/// Parse `KEY=value` lines. Missing file yields an empty map.
///
/// Blank lines and `#` comments are skipped; surrounding quotes are stripped.
pub fn parse_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    if !path.exists() {
        return Ok(map);
    }
    let content = std::fs::read_to_string(path)?;
    for (idx, line) in content.lines().enumerate() {
        let s = line.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        let s = s.strip_prefix("export ").unwrap_or(s);
        match s.split_once('=') {
            Some((key, value)) => {
                let mut value = value.trim();
                if value.len() >= 2
                    && ((value.starts_with('"') && value.ends_with('"'))
                        || (value.starts_with('\'') && value.ends_with('\'')))
                {
                    value = &value[1..value.len() - 1];
                }
                map.insert(key.trim().to_string(), value.to_string());
            }
            None => {
                tracing::warn!(line = idx + 1, path = %path.display(), "ignoring .env line without '='");
            }
        }
    }
    Ok(map)
}
