//! Conversation state machine.
//!
//! `transition` is pure: it takes the current state of a chat and one incoming
//! event, and returns the next state plus the effects the service must carry
//! out (replies, repository calls). Nothing here touches the network.

use crate::bot::fields::{FieldKind, FieldValue};
use crate::bot::{format, keyboards};
use crate::models::{Participant, Role};
use crate::schedule::ScheduleRange;
use crate::search::fuzzy;
use crate::telegram::{BotCommandInfo, InlineKeyboardMarkup};

/// Commands shown in the Telegram command menu.
pub const COMMANDS: [BotCommandInfo; 11] = [
    BotCommandInfo { command: "start", description: "Главное меню" },
    BotCommandInfo { command: "search", description: "Поиск по имени" },
    BotCommandInfo { command: "room", description: "Поиск по комнате" },
    BotCommandInfo { command: "floor", description: "Поиск по этажу" },
    BotCommandInfo { command: "list", description: "Список участников" },
    BotCommandInfo { command: "add", description: "Добавить участника" },
    BotCommandInfo { command: "export", description: "Выгрузка в CSV" },
    BotCommandInfo { command: "stats", description: "Статистика" },
    BotCommandInfo { command: "schedule", description: "Расписание" },
    BotCommandInfo { command: "help", description: "Справка" },
    BotCommandInfo { command: "cancel", description: "Отменить действие" },
];

const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Order of questions when adding a participant.
const ADD_ORDER: [FieldKind; 9] = [
    FieldKind::FullNameRu,
    FieldKind::FullNameEn,
    FieldKind::Gender,
    FieldKind::Size,
    FieldKind::Role,
    FieldKind::Department,
    FieldKind::Church,
    FieldKind::CountryAndCity,
    FieldKind::ContactInformation,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Name,
    Room,
    Floor,
}

impl SearchMode {
    pub fn key(self) -> &'static str {
        match self {
            SearchMode::Name => "name",
            SearchMode::Room => "room",
            SearchMode::Floor => "floor",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "name" => Some(SearchMode::Name),
            "room" => Some(SearchMode::Room),
            "floor" => Some(SearchMode::Floor),
            _ => None,
        }
    }

    fn prompt(self) -> &'static str {
        match self {
            SearchMode::Name => "Введите имя или фамилию участника:",
            SearchMode::Room => "Введите номер комнаты:",
            SearchMode::Floor => "Введите номер этажа:",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFilter {
    All,
    Candidates,
    Team,
}

impl ListFilter {
    pub fn key(self) -> &'static str {
        match self {
            ListFilter::All => "all",
            ListFilter::Candidates => "cand",
            ListFilter::Team => "team",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ListFilter::All => "Все участники",
            ListFilter::Candidates => "Кандидаты",
            ListFilter::Team => "Команда",
        }
    }

    /// Accepts callback keys plus the English and Russian words.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_lowercase().as_str() {
            "all" | "все" => Some(ListFilter::All),
            "cand" | "candidates" | "кандидаты" => Some(ListFilter::Candidates),
            "team" | "команда" => Some(ListFilter::Team),
            _ => None,
        }
    }

    pub fn matches(self, p: &Participant) -> bool {
        match self {
            ListFilter::All => true,
            ListFilter::Candidates => p.role == Role::Candidate,
            ListFilter::Team => p.role == Role::Team,
        }
    }
}

fn schedule_range_from_arg(arg: &str) -> Option<ScheduleRange> {
    match arg.trim().to_lowercase().as_str() {
        "сегодня" => Some(ScheduleRange::Today),
        "завтра" => Some(ScheduleRange::Tomorrow),
        "неделя" => Some(ScheduleRange::Week),
        other => ScheduleRange::from_key(other),
    }
}

/// A slash command with its argument, if any.
#[derive(Debug, Clone, PartialEq)]
pub enum BotCommand {
    Start,
    Help,
    Search(Option<String>),
    Room(Option<String>),
    Floor(Option<String>),
    List(Option<ListFilter>),
    Add,
    Export,
    Stats,
    Schedule(Option<ScheduleRange>),
    Cancel,
    Unknown {
        name: String,
        suggestion: Option<&'static str>,
    },
}

impl BotCommand {
    /// Parse `/name[@bot] args`. Returns `None` for plain text.
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.trim().strip_prefix('/')?;
        let (head, args) = match rest.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args.trim()),
            None => (rest, ""),
        };
        let name = head.split('@').next().unwrap_or(head).to_lowercase();
        let arg = (!args.is_empty()).then(|| args.to_string());

        let cmd = match name.as_str() {
            "start" | "menu" => BotCommand::Start,
            "help" => BotCommand::Help,
            "search" | "find" => BotCommand::Search(arg),
            "room" => BotCommand::Room(arg),
            "floor" => BotCommand::Floor(arg),
            "list" => BotCommand::List(arg.as_deref().and_then(ListFilter::from_key)),
            "add" => BotCommand::Add,
            "export" => BotCommand::Export,
            "stats" => BotCommand::Stats,
            "schedule" => BotCommand::Schedule(arg.as_deref().and_then(schedule_range_from_arg)),
            "cancel" => BotCommand::Cancel,
            _ => {
                let suggestion = fuzzy::closest(
                    &name,
                    COMMANDS.iter().map(|c| c.command),
                    SUGGESTION_THRESHOLD,
                )
                .map(|(cmd, _)| cmd);
                BotCommand::Unknown { name, suggestion }
            }
        };
        Some(cmd)
    }
}

/// Button payloads, encoded into Telegram `callback_data` (max 64 bytes).
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackAction {
    Menu,
    Mode(SearchMode),
    ListMenu,
    List(ListFilter),
    ScheduleMenu,
    Schedule(ScheduleRange),
    RefreshSchedule,
    Export,
    Stats,
    Add,
    Select(String),
    Edit(String),
    Field(FieldKind),
    Choice(String),
    Skip,
    Delete(String),
    ConfirmDelete,
    Save,
    Back,
    Cancel,
}

impl CallbackAction {
    pub fn to_data(&self) -> String {
        match self {
            CallbackAction::Menu => "menu".to_string(),
            CallbackAction::Mode(m) => format!("mode:{}", m.key()),
            CallbackAction::ListMenu => "menu:list".to_string(),
            CallbackAction::List(f) => format!("list:{}", f.key()),
            CallbackAction::ScheduleMenu => "menu:sched".to_string(),
            CallbackAction::Schedule(r) => format!("sched:{}", r.key()),
            CallbackAction::RefreshSchedule => "sched:refresh".to_string(),
            CallbackAction::Export => "export".to_string(),
            CallbackAction::Stats => "stats".to_string(),
            CallbackAction::Add => "add".to_string(),
            CallbackAction::Select(id) => format!("sel:{}", id),
            CallbackAction::Edit(id) => format!("edit:{}", id),
            CallbackAction::Field(kind) => format!("field:{}", kind.key()),
            CallbackAction::Choice(key) => format!("choice:{}", key),
            CallbackAction::Skip => "skip".to_string(),
            CallbackAction::Delete(id) => format!("del:{}", id),
            CallbackAction::ConfirmDelete => "delok".to_string(),
            CallbackAction::Save => "save".to_string(),
            CallbackAction::Back => "back".to_string(),
            CallbackAction::Cancel => "cancel".to_string(),
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        let action = match data.split_once(':') {
            None => match data {
                "menu" => CallbackAction::Menu,
                "export" => CallbackAction::Export,
                "stats" => CallbackAction::Stats,
                "add" => CallbackAction::Add,
                "skip" => CallbackAction::Skip,
                "delok" => CallbackAction::ConfirmDelete,
                "save" => CallbackAction::Save,
                "back" => CallbackAction::Back,
                "cancel" => CallbackAction::Cancel,
                _ => return None,
            },
            Some(("menu", "list")) => CallbackAction::ListMenu,
            Some(("menu", "sched")) => CallbackAction::ScheduleMenu,
            Some(("mode", m)) => CallbackAction::Mode(SearchMode::from_key(m)?),
            Some(("list", f)) => CallbackAction::List(ListFilter::from_key(f)?),
            Some(("sched", "refresh")) => CallbackAction::RefreshSchedule,
            Some(("sched", r)) => CallbackAction::Schedule(ScheduleRange::from_key(r)?),
            Some(("field", k)) => CallbackAction::Field(FieldKind::from_key(k)?),
            Some(("choice", k)) if !k.is_empty() => CallbackAction::Choice(k.to_string()),
            Some(("sel", id)) if !id.is_empty() => CallbackAction::Select(id.to_string()),
            Some(("edit", id)) if !id.is_empty() => CallbackAction::Edit(id.to_string()),
            Some(("del", id)) if !id.is_empty() => CallbackAction::Delete(id.to_string()),
            _ => return None,
        };
        Some(action)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ConversationState {
    #[default]
    Idle,
    AwaitingQuery {
        mode: SearchMode,
    },
    Viewing {
        id: String,
    },
    ChoosingField {
        id: String,
    },
    EditingField {
        id: String,
        field: FieldKind,
    },
    ConfirmingDelete {
        id: String,
    },
    Adding {
        draft: Box<Participant>,
        field: FieldKind,
    },
    ConfirmingAdd {
        draft: Box<Participant>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Command(BotCommand),
    Text(String),
    Callback(CallbackAction),
}

impl Event {
    /// Classify an incoming message text.
    pub fn from_text(text: &str) -> Self {
        match BotCommand::parse(text) {
            Some(cmd) => Event::Command(cmd),
            None => Event::Text(text.trim().to_string()),
        }
    }
}

/// Work for the service to perform after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Reply {
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
    },
    SearchName(String),
    SearchRoom(String),
    SearchFloor(u32),
    ShowParticipant(String),
    List(ListFilter),
    Export,
    Stats,
    Schedule(ScheduleRange),
    RefreshSchedule,
    UpdateField {
        id: String,
        value: FieldValue,
    },
    Create(Box<Participant>),
    Delete(String),
}

fn reply(text: impl Into<String>) -> Effect {
    Effect::Reply {
        text: text.into(),
        keyboard: None,
    }
}

fn reply_with(text: impl Into<String>, keyboard: InlineKeyboardMarkup) -> Effect {
    Effect::Reply {
        text: text.into(),
        keyboard: Some(keyboard),
    }
}

fn menu() -> (ConversationState, Vec<Effect>) {
    (
        ConversationState::Idle,
        vec![reply_with(format::MENU_TEXT, keyboards::main_menu())],
    )
}

fn cancelled() -> (ConversationState, Vec<Effect>) {
    (
        ConversationState::Idle,
        vec![reply_with("Действие отменено.", keyboards::main_menu())],
    )
}

fn ask_query(mode: SearchMode) -> (ConversationState, Vec<Effect>) {
    (
        ConversationState::AwaitingQuery { mode },
        vec![reply_with(mode.prompt(), keyboards::cancel_only())],
    )
}

fn run_query(mode: SearchMode, query: &str) -> (ConversationState, Vec<Effect>) {
    let state = ConversationState::AwaitingQuery { mode };
    if query.trim().is_empty() {
        return (state, vec![reply(mode.prompt())]);
    }
    let effect = match mode {
        SearchMode::Name => Effect::SearchName(query.to_string()),
        SearchMode::Room => Effect::SearchRoom(query.to_string()),
        SearchMode::Floor => match query.trim().parse::<u32>() {
            Ok(floor) => Effect::SearchFloor(floor),
            Err(_) => reply("Номер этажа должен быть числом."),
        },
    };
    (state, vec![effect])
}

fn ask_field(field: FieldKind) -> Effect {
    reply_with(field.prompt(), keyboards::edit_prompt(field))
}

fn ask_add_field(field: FieldKind) -> Effect {
    reply_with(field.prompt(), keyboards::add_prompt(field))
}

fn start_add() -> (ConversationState, Vec<Effect>) {
    let field = ADD_ORDER[0];
    (
        ConversationState::Adding {
            draft: Box::default(),
            field,
        },
        vec![reply("➕ Новый участник"), ask_add_field(field)],
    )
}

/// Next question of the add dialog, skipping the department for candidates.
fn next_add_field(current: FieldKind, draft: &Participant) -> Option<FieldKind> {
    let pos = ADD_ORDER.iter().position(|f| *f == current)?;
    ADD_ORDER[pos + 1..]
        .iter()
        .copied()
        .find(|f| *f != FieldKind::Department || draft.role == Role::Team)
}

fn advance_add(draft: Box<Participant>, field: FieldKind) -> (ConversationState, Vec<Effect>) {
    match next_add_field(field, &draft) {
        Some(next) => (
            ConversationState::Adding { draft, field: next },
            vec![ask_add_field(next)],
        ),
        None => {
            let summary = format!("Проверьте данные:\n\n{}", format::participant_card(&draft));
            (
                ConversationState::ConfirmingAdd { draft },
                vec![reply_with(summary, keyboards::confirm_add())],
            )
        }
    }
}

fn add_input(
    mut draft: Box<Participant>,
    field: FieldKind,
    input: &str,
) -> (ConversationState, Vec<Effect>) {
    match field.parse(input) {
        Ok(value) => {
            value.apply(&mut draft);
            advance_add(draft, field)
        }
        Err(e) => (
            ConversationState::Adding { draft, field },
            vec![reply(format!("⚠️ {}", e))],
        ),
    }
}

fn edit_input(id: String, field: FieldKind, input: &str) -> (ConversationState, Vec<Effect>) {
    match field.parse(input) {
        Ok(value) => (
            ConversationState::Viewing { id: id.clone() },
            vec![Effect::UpdateField { id, value }],
        ),
        Err(e) => (
            ConversationState::EditingField { id, field },
            vec![reply(format!("⚠️ {}", e))],
        ),
    }
}

fn command(state: ConversationState, cmd: BotCommand) -> (ConversationState, Vec<Effect>) {
    match cmd {
        BotCommand::Cancel => cancelled(),
        BotCommand::Start => menu(),
        BotCommand::Help => (
            ConversationState::Idle,
            vec![reply_with(format::HELP_TEXT, keyboards::main_menu())],
        ),
        BotCommand::Search(None) => ask_query(SearchMode::Name),
        BotCommand::Search(Some(q)) => run_query(SearchMode::Name, &q),
        BotCommand::Room(None) => ask_query(SearchMode::Room),
        BotCommand::Room(Some(q)) => run_query(SearchMode::Room, &q),
        BotCommand::Floor(None) => ask_query(SearchMode::Floor),
        BotCommand::Floor(Some(q)) => run_query(SearchMode::Floor, &q),
        BotCommand::List(Some(filter)) => (ConversationState::Idle, vec![Effect::List(filter)]),
        BotCommand::List(None) => (
            ConversationState::Idle,
            vec![reply_with("Кого показать?", keyboards::list_filters())],
        ),
        BotCommand::Add => start_add(),
        BotCommand::Export => (ConversationState::Idle, vec![Effect::Export]),
        BotCommand::Stats => (ConversationState::Idle, vec![Effect::Stats]),
        BotCommand::Schedule(Some(range)) => {
            (ConversationState::Idle, vec![Effect::Schedule(range)])
        }
        BotCommand::Schedule(None) => (
            ConversationState::Idle,
            vec![reply_with("📅 Расписание на:", keyboards::schedule_ranges())],
        ),
        BotCommand::Unknown { name, suggestion } => {
            let name = format::escape_html(&name);
            let text = match suggestion {
                Some(s) => format!("Неизвестная команда /{}. Возможно, вы имели в виду /{}?", name, s),
                None => format!("Неизвестная команда /{}. Список команд: /help", name),
            };
            (state, vec![reply(text)])
        }
    }
}

fn callback(state: ConversationState, action: CallbackAction) -> (ConversationState, Vec<Effect>) {
    use CallbackAction as A;
    use ConversationState as S;

    match (state, action) {
        (_, A::Cancel) => cancelled(),
        (_, A::Menu) => menu(),
        (_, A::Mode(mode)) => ask_query(mode),
        (_, A::ListMenu) => (
            S::Idle,
            vec![reply_with("Кого показать?", keyboards::list_filters())],
        ),
        (_, A::List(filter)) => (S::Idle, vec![Effect::List(filter)]),
        (_, A::ScheduleMenu) => (
            S::Idle,
            vec![reply_with("📅 Расписание на:", keyboards::schedule_ranges())],
        ),
        (_, A::Schedule(range)) => (S::Idle, vec![Effect::Schedule(range)]),
        (_, A::RefreshSchedule) => (
            S::Idle,
            vec![
                Effect::RefreshSchedule,
                reply_with("🔄 Расписание обновлено.", keyboards::schedule_ranges()),
            ],
        ),
        (_, A::Export) => (S::Idle, vec![Effect::Export]),
        (_, A::Stats) => (S::Idle, vec![Effect::Stats]),
        (_, A::Add) => start_add(),
        (_, A::Select(id)) => (
            S::Viewing { id: id.clone() },
            vec![Effect::ShowParticipant(id)],
        ),
        (_, A::Edit(id)) => (
            S::ChoosingField { id },
            vec![reply_with("Какое поле изменить?", keyboards::field_list())],
        ),
        (_, A::Delete(id)) => (
            S::ConfirmingDelete { id },
            vec![reply_with("Удалить участника? Это действие необратимо.", keyboards::confirm_delete())],
        ),

        (S::ChoosingField { id }, A::Field(field)) => (
            S::EditingField { id, field },
            vec![ask_field(field)],
        ),
        (S::EditingField { id, field }, A::Choice(key)) => edit_input(id, field, &key),
        (S::Adding { draft, field }, A::Choice(key)) => add_input(draft, field, &key),
        (S::Adding { draft, field }, A::Skip) if !field.is_required() => advance_add(draft, field),
        (S::ConfirmingAdd { draft }, A::Save) => (S::Idle, vec![Effect::Create(draft)]),
        (S::ConfirmingDelete { id }, A::ConfirmDelete) => (S::Idle, vec![Effect::Delete(id)]),

        (S::ChoosingField { id } | S::EditingField { id, .. } | S::ConfirmingDelete { id }, A::Back) => (
            S::Viewing { id: id.clone() },
            vec![Effect::ShowParticipant(id)],
        ),
        (_, A::Back) => menu(),

        (state, _) => (
            state,
            vec![reply("Эта кнопка уже неактуальна. Главное меню: /start")],
        ),
    }
}

fn text(state: ConversationState, input: String) -> (ConversationState, Vec<Effect>) {
    use ConversationState as S;

    match state {
        S::Idle => {
            if input.is_empty() {
                menu()
            } else {
                (S::Idle, vec![Effect::SearchName(input)])
            }
        }
        S::AwaitingQuery { mode } => run_query(mode, &input),
        S::EditingField { id, field } => edit_input(id, field, &input),
        S::Adding { draft, field } => add_input(draft, field, &input),
        other => (
            other,
            vec![reply("Воспользуйтесь кнопками выше или отправьте /cancel.")],
        ),
    }
}

/// Advance one chat's conversation by one event.
pub fn transition(state: ConversationState, event: Event) -> (ConversationState, Vec<Effect>) {
    match event {
        Event::Command(cmd) => command(state, cmd),
        Event::Callback(action) => callback(state, action),
        Event::Text(input) => text(state, input),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Department, Gender, Size};

    fn replies(effects: &[Effect]) -> Vec<&str> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Reply { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn cb(data: &str) -> Event {
        Event::Callback(CallbackAction::parse(data).unwrap())
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(BotCommand::parse("/start"), Some(BotCommand::Start));
        assert_eq!(
            BotCommand::parse("/search@roster_bot  Иван Петров "),
            Some(BotCommand::Search(Some("Иван Петров".to_string())))
        );
        assert_eq!(BotCommand::parse("/room"), Some(BotCommand::Room(None)));
        assert_eq!(
            BotCommand::parse("/list команда"),
            Some(BotCommand::List(Some(ListFilter::Team)))
        );
        assert_eq!(
            BotCommand::parse("/schedule завтра"),
            Some(BotCommand::Schedule(Some(ScheduleRange::Tomorrow)))
        );
        assert_eq!(BotCommand::parse("Иван"), None);
    }

    #[test]
    fn test_unknown_command_reply_is_escaped() {
        let (state, effects) = transition(ConversationState::Idle, Event::from_text("/a<b>&"));
        assert_eq!(state, ConversationState::Idle);
        match effects.as_slice() {
            [Effect::Reply { text, .. }] => {
                assert!(text.contains("/a&lt;b&gt;&amp;"), "{}", text);
                assert!(!text.contains("<b>"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_command_suggestion() {
        match BotCommand::parse("/serch Иван") {
            Some(BotCommand::Unknown { name, suggestion }) => {
                assert_eq!(name, "serch");
                assert_eq!(suggestion, Some("search"));
            }
            other => panic!("unexpected {:?}", other),
        }
        match BotCommand::parse("/xyzzy") {
            Some(BotCommand::Unknown { suggestion, .. }) => assert_eq!(suggestion, None),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_callback_data_roundtrip_and_limits() {
        let actions = vec![
            CallbackAction::Menu,
            CallbackAction::Mode(SearchMode::Floor),
            CallbackAction::ListMenu,
            CallbackAction::List(ListFilter::Candidates),
            CallbackAction::Schedule(ScheduleRange::Week),
            CallbackAction::RefreshSchedule,
            CallbackAction::Select("recAbCdEfGhIjKlMn".to_string()),
            CallbackAction::Field(FieldKind::PaymentAmount),
            CallbackAction::Choice("3XL".to_string()),
            CallbackAction::ConfirmDelete,
        ];
        for action in actions {
            let data = action.to_data();
            assert!(data.len() <= 64);
            assert_eq!(CallbackAction::parse(&data), Some(action));
        }
        assert_eq!(CallbackAction::parse("sel:"), None);
        assert_eq!(CallbackAction::parse("bogus"), None);
        assert_eq!(CallbackAction::parse("field:nope"), None);
    }

    #[test]
    fn test_cancel_always_idle() {
        let states = vec![
            ConversationState::AwaitingQuery { mode: SearchMode::Room },
            ConversationState::EditingField {
                id: "rec1".to_string(),
                field: FieldKind::Floor,
            },
            ConversationState::Adding {
                draft: Box::default(),
                field: FieldKind::Size,
            },
        ];
        for state in states {
            let (next, effects) = transition(state.clone(), Event::Command(BotCommand::Cancel));
            assert_eq!(next, ConversationState::Idle);
            assert_eq!(replies(&effects), vec!["Действие отменено."]);
            let (next, _) = transition(state, cb("cancel"));
            assert_eq!(next, ConversationState::Idle);
        }
    }

    #[test]
    fn test_search_flow() {
        let (state, effects) = transition(ConversationState::Idle, Event::from_text("/search"));
        assert_eq!(state, ConversationState::AwaitingQuery { mode: SearchMode::Name });
        assert_eq!(effects.len(), 1);

        let (state, effects) = transition(state, Event::from_text("Иван"));
        assert_eq!(state, ConversationState::AwaitingQuery { mode: SearchMode::Name });
        assert_eq!(effects, vec![Effect::SearchName("Иван".to_string())]);

        let (_, effects) = transition(ConversationState::Idle, Event::from_text("/search Мария"));
        assert_eq!(effects, vec![Effect::SearchName("Мария".to_string())]);
    }

    #[test]
    fn test_idle_text_searches_by_name() {
        let (state, effects) = transition(ConversationState::Idle, Event::from_text("Петров"));
        assert_eq!(state, ConversationState::Idle);
        assert_eq!(effects, vec![Effect::SearchName("Петров".to_string())]);
    }

    #[test]
    fn test_floor_query_validation() {
        let state = ConversationState::AwaitingQuery { mode: SearchMode::Floor };
        let (state, effects) = transition(state, Event::from_text("второй"));
        assert_eq!(state, ConversationState::AwaitingQuery { mode: SearchMode::Floor });
        assert_eq!(replies(&effects), vec!["Номер этажа должен быть числом."]);

        let (_, effects) = transition(state, Event::from_text("2"));
        assert_eq!(effects, vec![Effect::SearchFloor(2)]);
    }

    #[test]
    fn test_edit_flow() {
        let (state, effects) = transition(ConversationState::Idle, cb("sel:rec1"));
        assert_eq!(state, ConversationState::Viewing { id: "rec1".to_string() });
        assert_eq!(effects, vec![Effect::ShowParticipant("rec1".to_string())]);

        let (state, _) = transition(state, cb("edit:rec1"));
        assert_eq!(state, ConversationState::ChoosingField { id: "rec1".to_string() });

        let (state, _) = transition(state, cb("field:room"));
        assert_eq!(
            state,
            ConversationState::EditingField {
                id: "rec1".to_string(),
                field: FieldKind::RoomNumber
            }
        );

        // invalid input keeps the state
        let (state, effects) = transition(state, Event::from_text("room 12"));
        assert!(matches!(state, ConversationState::EditingField { .. }));
        assert!(replies(&effects)[0].starts_with("⚠️"));

        let (state, effects) = transition(state, Event::from_text("305"));
        assert_eq!(state, ConversationState::Viewing { id: "rec1".to_string() });
        assert_eq!(
            effects,
            vec![Effect::UpdateField {
                id: "rec1".to_string(),
                value: FieldValue::RoomNumber(Some("305".to_string())),
            }]
        );
    }

    #[test]
    fn test_edit_choice_by_button() {
        let state = ConversationState::EditingField {
            id: "rec1".to_string(),
            field: FieldKind::PaymentStatus,
        };
        let (_, effects) = transition(state, cb("choice:Paid"));
        assert_eq!(
            effects,
            vec![Effect::UpdateField {
                id: "rec1".to_string(),
                value: FieldValue::PaymentStatus(crate::models::PaymentStatus::Paid),
            }]
        );
    }

    #[test]
    fn test_back_returns_to_card() {
        let state = ConversationState::ChoosingField { id: "rec9".to_string() };
        let (state, effects) = transition(state, cb("back"));
        assert_eq!(state, ConversationState::Viewing { id: "rec9".to_string() });
        assert_eq!(effects, vec![Effect::ShowParticipant("rec9".to_string())]);
    }

    #[test]
    fn test_delete_flow() {
        let (state, _) = transition(ConversationState::Viewing { id: "rec2".to_string() }, cb("del:rec2"));
        assert_eq!(state, ConversationState::ConfirmingDelete { id: "rec2".to_string() });
        let (state, effects) = transition(state, cb("delok"));
        assert_eq!(state, ConversationState::Idle);
        assert_eq!(effects, vec![Effect::Delete("rec2".to_string())]);
    }

    #[test]
    fn test_stale_confirm_ignored() {
        let (state, effects) = transition(ConversationState::Idle, cb("delok"));
        assert_eq!(state, ConversationState::Idle);
        assert!(!effects.iter().any(|e| matches!(e, Effect::Delete(_))));
    }

    #[test]
    fn test_add_flow_candidate_skips_department() {
        let (mut state, _) = transition(ConversationState::Idle, Event::from_text("/add"));
        let steps: Vec<Event> = vec![
            Event::from_text("Иван Петров"),
            cb("skip"),
            cb("choice:M"),
            Event::from_text("xl"),
            cb("choice:CANDIDATE"),
            Event::from_text("Церковь Благодать"),
            Event::from_text("-"),
            cb("skip"),
        ];
        for step in steps {
            let (next, effects) = transition(state, step);
            assert!(
                !replies(&effects).iter().any(|r| r.starts_with("⚠️")),
                "{:?}",
                effects
            );
            state = next;
        }
        let draft = match &state {
            ConversationState::ConfirmingAdd { draft } => draft.clone(),
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(draft.full_name_ru, "Иван Петров");
        assert_eq!(draft.full_name_en, None);
        assert_eq!(draft.gender, Some(Gender::M));
        assert_eq!(draft.size, Some(Size::XL));
        assert_eq!(draft.church.as_deref(), Some("Церковь Благодать"));
        assert_eq!(draft.department, None);

        let (state, effects) = transition(state, cb("save"));
        assert_eq!(state, ConversationState::Idle);
        assert_eq!(effects, vec![Effect::Create(draft)]);
    }

    #[test]
    fn test_add_flow_team_asks_department() {
        let mut draft = Participant::new("Анна");
        draft.role = Role::Team;
        assert_eq!(
            next_add_field(FieldKind::Role, &draft),
            Some(FieldKind::Department)
        );
        draft.role = Role::Candidate;
        assert_eq!(next_add_field(FieldKind::Role, &draft), Some(FieldKind::Church));
        assert_eq!(next_add_field(FieldKind::ContactInformation, &draft), None);

        let state = ConversationState::Adding {
            draft: Box::new(Participant::new("Анна")),
            field: FieldKind::Department,
        };
        let (state, _) = transition(state, cb("choice:Media"));
        match state {
            ConversationState::Adding { draft, field } => {
                assert_eq!(draft.department, Some(Department::Media));
                assert_eq!(field, FieldKind::Church);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_required_field_cannot_be_skipped() {
        let state = ConversationState::Adding {
            draft: Box::default(),
            field: FieldKind::FullNameRu,
        };
        let (state, _) = transition(state, cb("skip"));
        assert!(matches!(
            state,
            ConversationState::Adding { field: FieldKind::FullNameRu, .. }
        ));
    }

    #[test]
    fn test_text_while_confirming_keeps_state() {
        let state = ConversationState::ConfirmingDelete { id: "rec1".to_string() };
        let (next, effects) = transition(state.clone(), Event::from_text("да"));
        assert_eq!(next, state);
        assert_eq!(effects.len(), 1);
    }
}
