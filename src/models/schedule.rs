//! Schedule entry from the Airtable "Schedule" table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEvent {
    #[serde(skip)]
    pub id: Option<String>,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    /// Local time as "HH:MM".
    #[serde(rename = "StartTime", default)]
    pub start_time: Option<String>,
    #[serde(rename = "EndTime", default)]
    pub end_time: Option<String>,
    #[serde(rename = "EventName", default)]
    pub title: String,
    #[serde(rename = "Location", default)]
    pub location: Option<String>,
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
}

impl ScheduleEvent {
    /// Sort key: date, then start time (events without a time go first).
    pub fn sort_key(&self) -> (NaiveDate, String) {
        (self.date, self.start_time.clone().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize() {
        let json = r#"{"Date": "2026-10-20", "StartTime": "09:00", "EventName": "Завтрак"}"#;
        let e: ScheduleEvent = serde_json::from_str(json).unwrap();
        assert_eq!(e.date, NaiveDate::from_ymd_opt(2026, 10, 20).unwrap());
        assert_eq!(e.start_time.as_deref(), Some("09:00"));
        assert_eq!(e.title, "Завтрак");
        assert!(e.location.is_none());
    }
}
