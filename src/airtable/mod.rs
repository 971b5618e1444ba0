//! Airtable data source: REST client and record repositories.

pub mod client;
pub mod participants;
pub mod schedule;

pub use client::{AirtableClient, AirtableConfig};
pub use participants::{AirtableParticipants, InMemoryParticipants, ParticipantRepository};
pub use schedule::{AirtableSchedule, ScheduleSource};

use crate::config::Settings;
use crate::error::Result;

/// Build both repositories from settings.
pub fn from_settings(settings: &Settings) -> Result<(AirtableParticipants, AirtableSchedule)> {
    let config = AirtableConfig::new(&settings.airtable_token, &settings.airtable_base_id);
    let participants = AirtableParticipants::new(
        AirtableClient::new(config.clone())?,
        &settings.participants_table,
    );
    let schedule = AirtableSchedule::new(AirtableClient::new(config)?, &settings.schedule_table);
    Ok((participants, schedule))
}
