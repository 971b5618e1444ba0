//! Per-chat sessions and effect execution.
//!
//! `BotService` feeds incoming updates through the state machine and carries
//! out the resulting effects against the repository, the schedule and the
//! messenger.
//!
//! CHANGELOG:
//! - 10/19/2026 - Session idle timeout
//! - 10/19/2026 - Initial implementation

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use crate::airtable::{ParticipantRepository, ScheduleSource};
use crate::bot::state::{transition, CallbackAction, ConversationState, Effect, Event};
use crate::bot::{format, keyboards};
use crate::cache::Clock;
use crate::config::{Settings, DEFAULT_SESSION_TIMEOUT_MINUTES, DEFAULT_UTC_OFFSET_HOURS};
use crate::error::{BotError, Result};
use crate::export::{export_file_name, participants_to_csv};
use crate::schedule::ScheduleService;
use crate::search::{self, rank, SearchOptions};
use crate::stats::Statistics;
use crate::telegram::{CallbackQuery, Message, Messenger, Update};

#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub search: SearchOptions,
    /// Empty allows everyone.
    pub allowed_user_ids: Vec<i64>,
    pub session_timeout: chrono::Duration,
    pub utc_offset: FixedOffset,
}

impl ServiceOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            search: settings.search,
            allowed_user_ids: settings.allowed_user_ids.clone(),
            session_timeout: settings.session_timeout,
            utc_offset: settings.utc_offset,
        }
    }
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            search: SearchOptions::default(),
            allowed_user_ids: Vec::new(),
            session_timeout: chrono::Duration::minutes(DEFAULT_SESSION_TIMEOUT_MINUTES),
            utc_offset: FixedOffset::east_opt(DEFAULT_UTC_OFFSET_HOURS * 3600).unwrap_or(Utc.fix()),
        }
    }
}

#[derive(Debug)]
struct Session {
    state: ConversationState,
    last_seen: DateTime<Utc>,
}

pub struct BotService<R, S, M>
where
    R: ParticipantRepository,
    S: ScheduleSource,
    M: Messenger,
{
    repo: R,
    schedule: ScheduleService<S>,
    messenger: M,
    options: ServiceOptions,
    clock: Arc<dyn Clock>,
    sessions: HashMap<i64, Session>,
}

impl<R, S, M> BotService<R, S, M>
where
    R: ParticipantRepository,
    S: ScheduleSource,
    M: Messenger,
{
    pub fn new(
        repo: R,
        schedule: ScheduleService<S>,
        messenger: M,
        options: ServiceOptions,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            schedule,
            messenger,
            options,
            clock,
            sessions: HashMap::new(),
        }
    }

    pub fn messenger(&self) -> &M {
        &self.messenger
    }

    /// Current conversation state of a chat, if it has one.
    pub fn state(&self, chat_id: i64) -> Option<&ConversationState> {
        self.sessions.get(&chat_id).map(|s| &s.state)
    }

    pub fn is_authorized(&self, user_id: i64) -> bool {
        self.options.allowed_user_ids.is_empty() || self.options.allowed_user_ids.contains(&user_id)
    }

    /// Handle one update from `getUpdates`.
    pub fn handle_update(&mut self, update: Update) -> Result<()> {
        if let Some(cb) = update.callback_query {
            return self.handle_callback(cb);
        }
        if let Some(msg) = update.message {
            return self.handle_message(msg);
        }
        tracing::debug!(update_id = update.update_id, "ignoring update without message");
        Ok(())
    }

    fn handle_message(&mut self, msg: Message) -> Result<()> {
        let Some(text) = msg.text else {
            return Ok(());
        };
        let user_id = msg.from.as_ref().map(|u| u.id).unwrap_or(msg.chat.id);
        if !self.is_authorized(user_id) {
            tracing::warn!(user_id, "rejected message from unauthorized user");
            return self
                .messenger
                .send_text(msg.chat.id, "⛔ У вас нет доступа к этому боту.", None);
        }
        self.dispatch(msg.chat.id, Event::from_text(&text))
    }

    fn handle_callback(&mut self, cb: CallbackQuery) -> Result<()> {
        let allowed = self.is_authorized(cb.from.id);
        // The button spinner keeps going until answered
        if let Err(e) = self
            .messenger
            .answer_callback(&cb.id, (!allowed).then_some("Нет доступа"))
        {
            tracing::warn!("answerCallbackQuery failed: {}", e);
        }
        if !allowed {
            tracing::warn!(user_id = cb.from.id, "rejected callback from unauthorized user");
            return Ok(());
        }

        let Some(chat_id) = cb.message.as_ref().map(|m| m.chat.id) else {
            return Ok(());
        };
        match cb.data.as_deref().and_then(CallbackAction::parse) {
            Some(action) => self.dispatch(chat_id, Event::Callback(action)),
            None => {
                tracing::debug!(data = ?cb.data, "unknown callback data");
                Ok(())
            }
        }
    }

    /// Run one event through the state machine for `chat_id`.
    pub fn dispatch(&mut self, chat_id: i64, event: Event) -> Result<()> {
        let now = self.clock.now();
        let state = self.take_state(chat_id, now);
        let (next, effects) = transition(state, event);
        self.sessions.insert(chat_id, Session { state: next, last_seen: now });

        for effect in effects {
            if let Err(e) = self.execute(chat_id, effect) {
                return self.report_error(chat_id, e);
            }
        }
        Ok(())
    }

    fn take_state(&mut self, chat_id: i64, now: DateTime<Utc>) -> ConversationState {
        match self.sessions.remove(&chat_id) {
            Some(s) if now - s.last_seen <= self.options.session_timeout => s.state,
            Some(_) => {
                tracing::debug!(chat_id, "session expired");
                ConversationState::Idle
            }
            None => ConversationState::Idle,
        }
    }

    /// Drop sessions idle for longer than the timeout. Returns how many went.
    pub fn expire_sessions(&mut self) -> usize {
        let now = self.clock.now();
        let timeout = self.options.session_timeout;
        let before = self.sessions.len();
        self.sessions.retain(|_, s| now - s.last_seen <= timeout);
        before - self.sessions.len()
    }

    fn report_error(&mut self, chat_id: i64, err: BotError) -> Result<()> {
        match err {
            BotError::NotFound(id) => {
                tracing::info!(chat_id, id = %id, "participant not found");
                self.sessions.remove(&chat_id);
                self.messenger.send_text(
                    chat_id,
                    "Участник не найден. Возможно, запись уже удалена.",
                    Some(&keyboards::main_menu()),
                )
            }
            other => {
                tracing::error!(chat_id, "effect failed: {}", other);
                self.messenger.send_text(
                    chat_id,
                    "⚠️ Не удалось выполнить действие. Попробуйте ещё раз позже.",
                    None,
                )
            }
        }
    }

    fn local_today(&self) -> NaiveDate {
        self.clock
            .now()
            .with_timezone(&self.options.utc_offset)
            .date_naive()
    }

    fn execute(&mut self, chat_id: i64, effect: Effect) -> Result<()> {
        match effect {
            Effect::Reply { text, keyboard } => {
                self.messenger.send_text(chat_id, &text, keyboard.as_ref())
            }
            Effect::SearchName(query) => {
                let participants = self.repo.list_all()?;
                let results = rank(&query, &participants, self.options.search);
                tracing::info!(chat_id, hits = results.len(), "name search");
                let text = format::search_results(&query, &results);
                let kb = keyboards::search_results(results.iter().map(|r| r.item));
                self.messenger.send_text(chat_id, &text, Some(&kb))
            }
            Effect::SearchRoom(room) => {
                let participants = self.repo.list_all()?;
                let found = search::find_by_room(&participants, &room);
                let text = format::participant_list(
                    &format!("Комната {}", room.trim()),
                    &found,
                    &format!("В комнате {} никого нет.", format::escape_html(room.trim())),
                );
                let kb = keyboards::search_results(found.iter().copied());
                self.messenger.send_text(chat_id, &text, Some(&kb))
            }
            Effect::SearchFloor(floor) => {
                let participants = self.repo.list_all()?;
                let found = search::find_by_floor(&participants, floor);
                let text = format::participant_list(
                    &format!("{} этаж", floor),
                    &found,
                    &format!("На {} этаже никого нет.", floor),
                );
                let kb = keyboards::search_results(found.iter().copied());
                self.messenger.send_text(chat_id, &text, Some(&kb))
            }
            Effect::ShowParticipant(id) => {
                let p = self.repo.require(&id)?;
                self.messenger.send_text(
                    chat_id,
                    &format::participant_card(&p),
                    Some(&keyboards::participant_actions(&id)),
                )
            }
            Effect::List(filter) => {
                let participants = self.repo.list_all()?;
                let text = format::filtered_list(filter, &participants);
                self.messenger
                    .send_text(chat_id, &text, Some(&keyboards::list_filters()))
            }
            Effect::Export => {
                let participants = self.repo.list_all()?;
                let csv = participants_to_csv(&participants)?;
                let name = export_file_name(self.local_today());
                tracing::info!(chat_id, rows = participants.len(), file = %name, "exporting");
                self.messenger.send_document(
                    chat_id,
                    &name,
                    csv,
                    Some(&format!("Участников: {}", participants.len())),
                )
            }
            Effect::Stats => {
                let stats = Statistics::collect(&self.repo.list_all()?);
                self.messenger
                    .send_text(chat_id, &format::statistics(&stats), Some(&keyboards::main_menu()))
            }
            Effect::Schedule(range) => {
                let dates = range.resolve(self.local_today());
                let events = self.schedule.events_between(dates)?;
                self.messenger.send_text(
                    chat_id,
                    &format::schedule(range.label(), &events),
                    Some(&keyboards::schedule_ranges()),
                )
            }
            Effect::RefreshSchedule => {
                self.schedule.refresh();
                Ok(())
            }
            Effect::UpdateField { id, value } => {
                let mut p = self.repo.require(&id)?;
                let kind = value.kind();
                value.apply(&mut p);
                let saved = self.repo.update(&p)?;
                tracing::info!(chat_id, id = %id, field = kind.key(), "field updated");
                let text = format!(
                    "✅ Поле «{}» обновлено.\n\n{}",
                    kind.label(),
                    format::participant_card(&saved)
                );
                self.messenger
                    .send_text(chat_id, &text, Some(&keyboards::participant_actions(&id)))
            }
            Effect::Create(draft) => {
                let saved = self.repo.create(&draft)?;
                let id = saved.id.clone().unwrap_or_default();
                let text = format!("✅ Участник добавлен.\n\n{}", format::participant_card(&saved));
                self.messenger
                    .send_text(chat_id, &text, Some(&keyboards::participant_actions(&id)))
            }
            Effect::Delete(id) => {
                let p = self.repo.require(&id)?;
                self.repo.delete(&id)?;
                let text = format!("🗑 {} удалён(а).", format::escape_html(p.display_name()));
                self.messenger
                    .send_text(chat_id, &text, Some(&keyboards::main_menu()))
            }
        }
    }

    /// Send the statistics summary for `date` to every chat in `chat_ids`.
    ///
    /// A failing chat is logged and skipped.
    pub fn send_daily_report(&mut self, chat_ids: &[i64], date: NaiveDate) -> Result<()> {
        if chat_ids.is_empty() {
            return Ok(());
        }
        let stats = Statistics::collect(&self.repo.list_all()?);
        let text = format::format_daily_report(&stats, date);
        for chat_id in chat_ids {
            if let Err(e) = self.messenger.send_text(*chat_id, &text, None) {
                tracing::warn!(chat_id, "daily report not delivered: {}", e);
            }
        }
        tracing::info!(%date, chats = chat_ids.len(), "daily report sent");
        Ok(())
    }
}
