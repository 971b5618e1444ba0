//! Daily statistics notification timing.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

/// Fire once a day at a fixed local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    pub time: NaiveTime,
    pub offset: FixedOffset,
}

impl DailySchedule {
    pub fn new(time: NaiveTime, offset: FixedOffset) -> Self {
        Self { time, offset }
    }

    /// Local calendar date at `now`.
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }

    /// First instant strictly after `now` where the local clock reads `time`.
    pub fn next_run_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local_today = self.local_date(now);
        let candidate = self.at_local(local_today);
        if candidate > now {
            candidate
        } else {
            self.at_local(local_today + Duration::days(1))
        }
    }

    fn at_local(&self, date: NaiveDate) -> DateTime<Utc> {
        // Fixed offsets have no gaps or folds, so the mapping is unique
        self.offset
            .from_local_datetime(&date.and_time(self.time))
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&date.and_time(self.time)))
    }
}

/// Wait between attempts after a report could not be sent.
pub const RETRY_DELAY_MINUTES: i64 = 5;

/// Tracks when the daily notification is next due.
#[derive(Debug, Clone)]
pub struct DailyNotifier {
    schedule: DailySchedule,
    next_run: DateTime<Utc>,
}

impl DailyNotifier {
    pub fn new(schedule: DailySchedule, now: DateTime<Utc>) -> Self {
        Self {
            schedule,
            next_run: schedule.next_run_after(now),
        }
    }

    pub fn next_run(&self) -> DateTime<Utc> {
        self.next_run
    }

    /// If due at `now`, advance to the following day and return the local
    /// date the report is for.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<NaiveDate> {
        if now < self.next_run {
            return None;
        }
        let date = self.schedule.local_date(self.next_run);
        self.next_run = self.schedule.next_run_after(now);
        Some(date)
    }

    /// Re-arm after a failed report for `date`. Returns `false` once the
    /// retry would land on the next local day, which leaves the regular
    /// schedule in place.
    pub fn retry(&mut self, date: NaiveDate, now: DateTime<Utc>) -> bool {
        let at = now + Duration::minutes(RETRY_DELAY_MINUTES);
        if self.schedule.local_date(at) != date {
            return false;
        }
        self.next_run = at;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn moscow_8pm() -> DailySchedule {
        DailySchedule::new(
            NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            FixedOffset::east_opt(3 * 3600).unwrap(),
        )
    }

    #[test]
    fn test_next_run_same_day() {
        let s = moscow_8pm();
        // 10:00 UTC = 13:00 local
        assert_eq!(s.next_run_after(utc("2026-10-19T10:00:00Z")), utc("2026-10-19T17:00:00Z"));
    }

    #[test]
    fn test_next_run_exactly_at_time_goes_to_tomorrow() {
        let s = moscow_8pm();
        assert_eq!(s.next_run_after(utc("2026-10-19T17:00:00Z")), utc("2026-10-20T17:00:00Z"));
    }

    #[test]
    fn test_next_run_after_local_midnight() {
        let s = moscow_8pm();
        // 22:30 UTC = 01:30 local next day
        assert_eq!(s.next_run_after(utc("2026-10-19T22:30:00Z")), utc("2026-10-20T17:00:00Z"));
    }

    #[test]
    fn test_notifier_fires_once() {
        let mut n = DailyNotifier::new(moscow_8pm(), utc("2026-10-19T10:00:00Z"));
        assert_eq!(n.poll(utc("2026-10-19T16:59:59Z")), None);
        assert_eq!(
            n.poll(utc("2026-10-19T17:00:05Z")),
            Some(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap())
        );
        assert_eq!(n.poll(utc("2026-10-19T17:01:00Z")), None);
        assert_eq!(n.next_run(), utc("2026-10-20T17:00:00Z"));
    }

    #[test]
    fn test_notifier_after_long_gap_fires_once() {
        let mut n = DailyNotifier::new(moscow_8pm(), utc("2026-10-19T10:00:00Z"));
        assert!(n.poll(utc("2026-10-22T12:00:00Z")).is_some());
        assert_eq!(n.next_run(), utc("2026-10-22T17:00:00Z"));
        assert!(n.poll(utc("2026-10-22T12:00:01Z")).is_none());
    }

    #[test]
    fn test_failed_report_retried_same_day() {
        let mut n = DailyNotifier::new(moscow_8pm(), utc("2026-10-19T10:00:00Z"));
        let date = n.poll(utc("2026-10-19T17:00:05Z")).unwrap();
        assert!(n.retry(date, utc("2026-10-19T17:00:05Z")));
        assert_eq!(n.poll(utc("2026-10-19T17:03:00Z")), None);
        assert_eq!(n.poll(utc("2026-10-19T17:05:10Z")), Some(date));
        assert_eq!(n.next_run(), utc("2026-10-20T17:00:00Z"));
    }

    #[test]
    fn test_no_retry_past_local_midnight() {
        let mut n = DailyNotifier::new(moscow_8pm(), utc("2026-10-19T10:00:00Z"));
        let date = n.poll(utc("2026-10-19T17:00:05Z")).unwrap();
        // 20:58 UTC = 23:58 local; five minutes later is the 20th
        assert!(!n.retry(date, utc("2026-10-19T20:58:00Z")));
        assert_eq!(n.next_run(), utc("2026-10-20T17:00:00Z"));
    }
}
