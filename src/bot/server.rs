//! Long-polling loop.
//!
//! Pulls updates with `getUpdates`, hands them to `BotService` one at a time,
//! and fires the daily report when it is due.

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::airtable::{self, AirtableParticipants, AirtableSchedule, ParticipantRepository, ScheduleSource};
use crate::bot::service::{BotService, ServiceOptions};
use crate::bot::state::COMMANDS;
use crate::cache::{Clock, SystemClock};
use crate::config::Settings;
use crate::error::Result;
use crate::notify::{DailyNotifier, DailySchedule};
use crate::schedule::ScheduleService;
use crate::telegram::BotApi;

/// Long-poll duration passed to `getUpdates`.
pub const POLL_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Delay before the next poll after `failures` consecutive errors: 1s, 2s, 4s... capped at 60s.
pub fn backoff_delay(failures: u32) -> Duration {
    if failures == 0 {
        return Duration::ZERO;
    }
    let secs = 1u64.checked_shl(failures - 1).unwrap_or(u64::MAX);
    Duration::from_secs(secs).min(MAX_BACKOFF)
}

/// Offset to request next so `update_id` is acknowledged.
pub fn next_offset(current: i64, update_id: i64) -> i64 {
    current.max(update_id + 1)
}

/// Send the report if one is due; on failure, re-arm for a retry later the
/// same local day.
pub fn deliver_due_report<F>(notifier: &mut DailyNotifier, now: DateTime<Utc>, send: F)
where
    F: FnOnce(NaiveDate) -> Result<()>,
{
    let Some(date) = notifier.poll(now) else {
        return;
    };
    if let Err(e) = send(date) {
        if notifier.retry(date, now) {
            tracing::warn!(%date, next = %notifier.next_run(), "daily report failed, will retry: {}", e);
        } else {
            tracing::error!(%date, "daily report failed: {}", e);
        }
    }
}

pub struct BotServer<R: ParticipantRepository, S: ScheduleSource> {
    api: Arc<BotApi>,
    service: BotService<R, S, Arc<BotApi>>,
    notifier: Option<DailyNotifier>,
    notify_chat_ids: Vec<i64>,
    clock: Arc<dyn Clock>,
    offset: i64,
}

impl BotServer<AirtableParticipants, AirtableSchedule> {
    /// Wire up Airtable repositories and the Telegram client from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let (participants, schedule_source) = airtable::from_settings(settings)?;
        let schedule = ScheduleService::new(schedule_source, settings.schedule_cache_ttl, clock.clone());
        let api = Arc::new(BotApi::new(settings.telegram_token()?, POLL_TIMEOUT)?);
        let service = BotService::new(
            participants,
            schedule,
            api.clone(),
            ServiceOptions::from_settings(settings),
            clock.clone(),
        );
        Ok(Self::new(api, service, settings, clock))
    }
}

impl<R: ParticipantRepository, S: ScheduleSource> BotServer<R, S> {
    pub fn new(
        api: Arc<BotApi>,
        service: BotService<R, S, Arc<BotApi>>,
        settings: &Settings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let notifier = (!settings.notify_chat_ids.is_empty()).then(|| {
            DailyNotifier::new(
                DailySchedule::new(settings.notify_time, settings.utc_offset),
                clock.now(),
            )
        });
        if let Some(n) = &notifier {
            tracing::info!(next = %n.next_run(), chats = settings.notify_chat_ids.len(), "daily report scheduled");
        }
        Self {
            api,
            service,
            notifier,
            notify_chat_ids: settings.notify_chat_ids.clone(),
            clock,
            offset: 0,
        }
    }

    /// Poll until `shutdown` is set (blocking).
    pub fn serve(&mut self, shutdown: &AtomicBool) -> Result<()> {
        if let Err(e) = self.api.set_my_commands(&COMMANDS) {
            tracing::warn!("setMyCommands failed: {}", e);
        }
        tracing::info!("polling for updates");

        let mut failures = 0u32;
        while !shutdown.load(Ordering::SeqCst) {
            self.tick_notifier();

            match self.api.get_updates(self.offset, POLL_TIMEOUT) {
                Ok(updates) => {
                    failures = 0;
                    for update in updates {
                        let update_id = update.update_id;
                        self.offset = next_offset(self.offset, update_id);
                        if let Err(e) = self.service.handle_update(update) {
                            tracing::error!(update_id, "update failed: {}", e);
                        }
                    }
                    let expired = self.service.expire_sessions();
                    if expired > 0 {
                        tracing::debug!(expired, "sessions expired");
                    }
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    let delay = backoff_delay(failures);
                    tracing::warn!(failures, ?delay, "getUpdates failed: {}", e);
                    std::thread::sleep(delay);
                }
            }
        }

        tracing::info!("shutting down");
        Ok(())
    }

    fn tick_notifier(&mut self) {
        let Some(notifier) = self.notifier.as_mut() else {
            return;
        };
        let service = &mut self.service;
        let chats = &self.notify_chat_ids;
        deliver_due_report(notifier, self.clock.now(), |date| {
            service.send_daily_report(chats, date)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airtable::InMemoryParticipants;
    use crate::cache::tests::ManualClock;
    use crate::error::BotError;
    use crate::models::{Participant, ScheduleEvent};
    use crate::notify::DailySchedule;
    use crate::telegram::{InlineKeyboardMarkup, Messenger};
    use chrono::{FixedOffset, NaiveTime};
    use std::cell::{Cell, RefCell};

    struct Unreachable;

    impl ParticipantRepository for Unreachable {
        fn list_all(&self) -> Result<Vec<Participant>> {
            Err(BotError::AirtableApi { status: 503, message: "unavailable".to_string() })
        }
        fn get(&self, _id: &str) -> Result<Option<Participant>> {
            Ok(None)
        }
        fn create(&self, p: &Participant) -> Result<Participant> {
            Ok(p.clone())
        }
        fn update(&self, p: &Participant) -> Result<Participant> {
            Ok(p.clone())
        }
        fn delete(&self, _id: &str) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Outbox(RefCell<Vec<i64>>);

    impl Messenger for Outbox {
        fn send_text(&self, chat_id: i64, _text: &str, _kb: Option<&InlineKeyboardMarkup>) -> Result<()> {
            self.0.borrow_mut().push(chat_id);
            Ok(())
        }
        fn send_document(&self, _c: i64, _n: &str, _b: Vec<u8>, _cap: Option<&str>) -> Result<()> {
            Ok(())
        }
        fn answer_callback(&self, _id: &str, _text: Option<&str>) -> Result<()> {
            Ok(())
        }
    }

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn notifier() -> DailyNotifier {
        let schedule = DailySchedule::new(
            NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            FixedOffset::east_opt(3 * 3600).unwrap(),
        );
        DailyNotifier::new(schedule, utc("2026-10-19T10:00:00Z"))
    }

    fn service<R: ParticipantRepository>(repo: R) -> BotService<R, Vec<ScheduleEvent>, Outbox> {
        let clock = ManualClock::at(utc("2026-10-19T10:00:00Z"));
        let schedule = ScheduleService::new(Vec::new(), Duration::from_secs(300), clock.clone());
        BotService::new(repo, schedule, Outbox::default(), ServiceOptions::default(), clock)
    }

    #[test]
    fn test_failed_report_is_retried_same_day() {
        let mut n = notifier();
        let mut failing = service(Unreachable);
        deliver_due_report(&mut n, utc("2026-10-19T17:00:05Z"), |date| {
            failing.send_daily_report(&[7], date)
        });
        assert!(failing.messenger().0.borrow().is_empty());
        assert_eq!(n.next_run(), utc("2026-10-19T17:05:05Z"));

        let mut healthy = service(InMemoryParticipants::with(vec![Participant::new("Анна")]));
        let reported = Cell::new(None);
        deliver_due_report(&mut n, utc("2026-10-19T17:05:10Z"), |date| {
            reported.set(Some(date));
            healthy.send_daily_report(&[7], date)
        });
        assert_eq!(reported.get(), NaiveDate::from_ymd_opt(2026, 10, 19));
        assert_eq!(*healthy.messenger().0.borrow(), vec![7]);
        assert_eq!(n.next_run(), utc("2026-10-20T17:00:00Z"));
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        assert_eq!(backoff_delay(0), Duration::ZERO);
        assert_eq!(backoff_delay(1), Duration::from_secs(1));
        assert_eq!(backoff_delay(2), Duration::from_secs(2));
        assert_eq!(backoff_delay(4), Duration::from_secs(8));
        assert_eq!(backoff_delay(7), MAX_BACKOFF);
        assert_eq!(backoff_delay(200), MAX_BACKOFF);
    }

    #[test]
    fn test_next_offset_never_goes_back() {
        assert_eq!(next_offset(0, 10), 11);
        assert_eq!(next_offset(11, 10), 11);
        assert_eq!(next_offset(11, 15), 16);
    }
}
