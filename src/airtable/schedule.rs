//! Schedule table access.

use super::client::AirtableClient;
use crate::error::Result;
use crate::models::ScheduleEvent;

/// Anything that can produce the full event schedule.
pub trait ScheduleSource {
    fn list_events(&self) -> Result<Vec<ScheduleEvent>>;
}

pub struct AirtableSchedule {
    client: AirtableClient,
    table: String,
}

impl AirtableSchedule {
    pub fn new(client: AirtableClient, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }
}

impl ScheduleSource for AirtableSchedule {
    /// Rows that do not parse (no date, bad date) are skipped with a warning.
    fn list_events(&self) -> Result<Vec<ScheduleEvent>> {
        let records = self.client.list_records::<serde_json::Value>(&self.table)?;
        let events = records
            .into_iter()
            .filter_map(|record| match serde_json::from_value::<ScheduleEvent>(record.fields) {
                Ok(mut event) => {
                    event.id = Some(record.id);
                    Some(event)
                }
                Err(e) => {
                    tracing::warn!(id = %record.id, "skipping schedule row: {}", e);
                    None
                }
            })
            .collect();
        Ok(events)
    }
}

/// Fixed list of events (tests, offline runs).
impl ScheduleSource for Vec<ScheduleEvent> {
    fn list_events(&self) -> Result<Vec<ScheduleEvent>> {
        Ok(self.clone())
    }
}
