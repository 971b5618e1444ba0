//! Schedule command.

use anyhow::{Context, Result};
use chrono::NaiveDate;

use super::{load_settings, repositories};
use crate::airtable::ScheduleSource;
use crate::models::ScheduleEvent;
use crate::output::OutputControls;
use crate::schedule::{DateRange, ScheduleRange};

/// Events inside `range`, ordered by date and start time.
pub fn events_in(events: Vec<ScheduleEvent>, range: DateRange) -> Vec<ScheduleEvent> {
    let mut selected: Vec<ScheduleEvent> = events.into_iter().filter(|e| range.contains(e.date)).collect();
    selected.sort_by_key(|e| e.sort_key());
    selected
}

fn event_line(e: &ScheduleEvent) -> String {
    let time = match (&e.start_time, &e.end_time) {
        (Some(start), Some(end)) => format!("{}-{}", start, end),
        (Some(start), None) => start.clone(),
        _ => "--:--".to_string(),
    };
    let mut line = format!("{} {:<11} {}", e.date.format("%d.%m"), time, e.title);
    if let Some(location) = e.location.as_deref().filter(|l| !l.is_empty()) {
        line.push_str(&format!(" @ {}", location));
    }
    line
}

/// Print the schedule for `range` ("today", "tomorrow" or "week").
pub fn run(range: &str, date: Option<NaiveDate>, output: &OutputControls) -> Result<()> {
    let range = ScheduleRange::from_key(range)
        .with_context(|| format!("Unknown range '{}': use today, tomorrow or week", range))?;
    let settings = load_settings()?;
    let (_, source) = repositories(&settings)?;

    let today = date.unwrap_or_else(|| chrono::Utc::now().with_timezone(&settings.utc_offset).date_naive());
    let dates = range.resolve(today);
    let events = events_in(source.list_events().context("Failed to load schedule")?, dates);

    if output.json {
        output.print(&events);
        return Ok(());
    }
    println!("{} ({} - {}):", range.label(), dates.from, dates.to);
    if events.is_empty() {
        println!("No events.");
    }
    for e in &events {
        println!("{}", output.clip(&event_line(e)));
    }
    Ok(())
}
