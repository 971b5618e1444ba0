//! roster-bot library
//!
//! Participant records in Airtable, fuzzy search, and the Telegram bot that
//! fronts them. Shared by the CLI and daemon binaries.
//!
//! CHANGELOG:
//! - 10/19/2026 - Initial library structure

pub mod airtable;
pub mod bot;
pub mod cache;
pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod lock;
pub mod models;
pub mod notify;
pub mod output;
pub mod schedule;
pub mod search;
pub mod stats;
pub mod telegram;

pub use error::{BotError, Result};
