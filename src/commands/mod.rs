//! CLI command implementations.
//!
//! Each command loads settings, talks to Airtable directly and prints either
//! human-readable text or JSON (see `OutputControls`).
//!
//! CHANGELOG:
//! - 10/19/2026 - Initial module structure

pub mod notify;
pub mod participants;
pub mod schedule;
pub mod search;
pub mod stats;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::airtable::{self, AirtableParticipants, AirtableSchedule};
use crate::config::Settings;
use crate::models::Participant;

/// Load settings from the environment and `.env`.
pub fn load_settings() -> Result<Settings> {
    Settings::from_env().context("Failed to load settings")
}

/// Airtable repositories for the configured base.
pub fn repositories(settings: &Settings) -> Result<(AirtableParticipants, AirtableSchedule)> {
    airtable::from_settings(settings).context("Failed to create Airtable client")
}

/// Flat participant view for JSON output.
#[derive(Debug, Serialize, PartialEq)]
pub struct ParticipantRow {
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,
    pub role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    pub payment: &'static str,
}

impl From<&Participant> for ParticipantRow {
    fn from(p: &Participant) -> Self {
        Self {
            id: p.id.clone(),
            name: p.full_name_ru.clone(),
            name_en: p.full_name_en.clone(),
            role: p.role.key(),
            department: p.department.map(|d| d.key()),
            floor: p.floor,
            room: p.room_number.clone(),
            payment: p.payment_status.key(),
        }
    }
}

/// One line of text output: name, then room/floor when known.
pub fn text_line(p: &Participant) -> String {
    let mut line = p.display_name().to_string();
    if let Some(room) = p.room_number.as_deref().filter(|r| !r.trim().is_empty()) {
        line.push_str(&format!("  [room {}]", room));
    } else if let Some(floor) = p.floor {
        line.push_str(&format!("  [floor {}]", floor));
    }
    if let Some(id) = &p.id {
        line.push_str(&format!("  ({})", id));
    }
    line
}
