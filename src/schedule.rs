//! Event schedule lookups with a TTL cache keyed by date range.

use chrono::{Duration as ChronoDuration, NaiveDate};
use std::sync::Arc;
use std::time::Duration;

use crate::airtable::ScheduleSource;
use crate::cache::{Clock, TtlCache};
use crate::error::Result;
use crate::models::ScheduleEvent;

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        if from <= to {
            Self { from, to }
        } else {
            Self { from: to, to: from }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// Ranges offered to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleRange {
    Today,
    Tomorrow,
    Week,
}

impl ScheduleRange {
    pub fn key(self) -> &'static str {
        match self {
            ScheduleRange::Today => "today",
            ScheduleRange::Tomorrow => "tomorrow",
            ScheduleRange::Week => "week",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "today" => Some(ScheduleRange::Today),
            "tomorrow" => Some(ScheduleRange::Tomorrow),
            "week" => Some(ScheduleRange::Week),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScheduleRange::Today => "Сегодня",
            ScheduleRange::Tomorrow => "Завтра",
            ScheduleRange::Week => "Неделя",
        }
    }

    /// Concrete dates relative to the local `today`.
    pub fn resolve(self, today: NaiveDate) -> DateRange {
        match self {
            ScheduleRange::Today => DateRange::new(today, today),
            ScheduleRange::Tomorrow => {
                let t = today + ChronoDuration::days(1);
                DateRange::new(t, t)
            }
            ScheduleRange::Week => DateRange::new(today, today + ChronoDuration::days(6)),
        }
    }
}

/// Schedule access with caching.
pub struct ScheduleService<S: ScheduleSource> {
    source: S,
    cache: TtlCache<DateRange, Vec<ScheduleEvent>>,
}

impl<S: ScheduleSource> ScheduleService<S> {
    pub fn new(source: S, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            cache: TtlCache::new(ttl, clock),
        }
    }

    /// Events inside `range`, sorted by date and start time.
    pub fn events_between(&mut self, range: DateRange) -> Result<Vec<ScheduleEvent>> {
        if let Some(events) = self.cache.get(&range) {
            tracing::debug!(?range, "schedule cache hit");
            return Ok(events);
        }

        let mut events: Vec<ScheduleEvent> = self
            .source
            .list_events()?
            .into_iter()
            .filter(|e| range.contains(e.date))
            .collect();
        events.sort_by_key(|e| e.sort_key());

        self.cache.put(range, events.clone());
        Ok(events)
    }

    /// Drop every cached range.
    pub fn refresh(&mut self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::tests::ManualClock;
    use crate::error::BotError;
    use chrono::{DateTime, Utc};
    use std::cell::Cell;

    struct CountingSource {
        events: Vec<ScheduleEvent>,
        calls: Cell<u32>,
    }

    impl ScheduleSource for CountingSource {
        fn list_events(&self) -> Result<Vec<ScheduleEvent>> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.events.clone())
        }
    }

    struct FailingSource;

    impl ScheduleSource for FailingSource {
        fn list_events(&self) -> Result<Vec<ScheduleEvent>> {
            Err(BotError::AirtableApi {
                status: 503,
                message: "down".to_string(),
            })
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn event(d: u32, time: &str, title: &str) -> ScheduleEvent {
        ScheduleEvent {
            id: None,
            date: day(d),
            start_time: Some(time.to_string()),
            end_time: None,
            title: title.to_string(),
            location: None,
            description: None,
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-19T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_resolve_ranges() {
        assert_eq!(ScheduleRange::Today.resolve(day(19)), DateRange::new(day(19), day(19)));
        assert_eq!(ScheduleRange::Tomorrow.resolve(day(19)), DateRange::new(day(20), day(20)));
        assert_eq!(ScheduleRange::Week.resolve(day(19)), DateRange::new(day(19), day(25)));
        assert_eq!(ScheduleRange::from_key("week"), Some(ScheduleRange::Week));
        assert_eq!(ScheduleRange::from_key("month"), None);
    }

    #[test]
    fn test_date_range_swaps() {
        let r = DateRange::new(day(25), day(19));
        assert_eq!(r.from, day(19));
        assert!(r.contains(day(22)));
        assert!(!r.contains(day(26)));
    }

    #[test]
    fn test_filters_and_sorts() {
        let source = vec![
            event(20, "18:00", "Ужин"),
            event(20, "09:00", "Завтрак"),
            event(19, "20:00", "Открытие"),
            event(27, "09:00", "Позже"),
        ];
        let mut service = ScheduleService::new(source, Duration::from_secs(300), ManualClock::at(now()));
        let events = service
            .events_between(ScheduleRange::Week.resolve(day(19)))
            .unwrap();
        let titles: Vec<&str> = events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Открытие", "Завтрак", "Ужин"]);
    }

    #[test]
    fn test_cache_hits_until_ttl() {
        let clock = ManualClock::at(now());
        let source = CountingSource {
            events: vec![event(19, "09:00", "Завтрак")],
            calls: Cell::new(0),
        };
        let mut service = ScheduleService::new(source, Duration::from_secs(300), clock.clone());
        let range = ScheduleRange::Today.resolve(day(19));

        service.events_between(range).unwrap();
        service.events_between(range).unwrap();
        assert_eq!(service.source.calls.get(), 1);

        clock.advance(chrono::Duration::seconds(300));
        service.events_between(range).unwrap();
        assert_eq!(service.source.calls.get(), 2);

        service.refresh();
        service.events_between(range).unwrap();
        assert_eq!(service.source.calls.get(), 3);
    }

    #[test]
    fn test_source_error_propagates() {
        let mut service = ScheduleService::new(FailingSource, Duration::from_secs(300), ManualClock::at(now()));
        assert!(service
            .events_between(ScheduleRange::Today.resolve(day(19)))
            .is_err());
    }
}
