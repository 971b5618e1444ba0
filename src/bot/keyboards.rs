//! Inline keyboard layouts.

use crate::bot::fields::FieldKind;
use crate::bot::state::{CallbackAction, ListFilter, SearchMode};
use crate::models::Participant;
use crate::schedule::ScheduleRange;
use crate::telegram::{InlineKeyboardButton, InlineKeyboardMarkup};

fn button(text: impl Into<String>, action: CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::new(text, action.to_data())
}

fn cancel_button() -> InlineKeyboardButton {
    button("✖️ Отмена", CallbackAction::Cancel)
}

pub fn main_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("🔍 Поиск по имени", CallbackAction::Mode(SearchMode::Name))],
        vec![
            button("🚪 По комнате", CallbackAction::Mode(SearchMode::Room)),
            button("🏢 По этажу", CallbackAction::Mode(SearchMode::Floor)),
        ],
        vec![
            button("📋 Списки", CallbackAction::ListMenu),
            button("📊 Статистика", CallbackAction::Stats),
        ],
        vec![
            button("📅 Расписание", CallbackAction::ScheduleMenu),
            button("📤 Экспорт CSV", CallbackAction::Export),
        ],
        vec![button("➕ Добавить участника", CallbackAction::Add)],
    ])
}

pub fn cancel_only() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![cancel_button()]])
}

/// Participant buttons per result keyboard. Telegram rejects markups with
/// more than 100 buttons; the message text still lists everyone.
pub const MAX_RESULT_BUTTONS: usize = 50;

/// One button per found participant (at most `MAX_RESULT_BUTTONS`), then a
/// way back to the menu.
pub fn search_results<'a, I>(participants: I) -> InlineKeyboardMarkup
where
    I: IntoIterator<Item = &'a Participant>,
{
    let rows = participants
        .into_iter()
        .filter_map(|p| {
            let id = p.id.clone()?;
            Some(vec![button(p.display_name(), CallbackAction::Select(id))])
        })
        .take(MAX_RESULT_BUTTONS)
        .collect();
    InlineKeyboardMarkup::new(rows).push_row(vec![button("⬅️ Меню", CallbackAction::Menu)])
}

pub fn participant_actions(id: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button("✏️ Изменить", CallbackAction::Edit(id.to_string())),
            button("🗑 Удалить", CallbackAction::Delete(id.to_string())),
        ],
        vec![button("⬅️ Меню", CallbackAction::Menu)],
    ])
}

pub fn field_list() -> InlineKeyboardMarkup {
    let buttons = FieldKind::all()
        .map(|kind| button(kind.label(), CallbackAction::Field(kind)))
        .collect();
    InlineKeyboardMarkup::grid(buttons, 2).push_row(vec![button("⬅️ Назад", CallbackAction::Back)])
}

fn choice_buttons(field: FieldKind) -> Vec<InlineKeyboardButton> {
    field
        .options()
        .into_iter()
        .map(|o| button(o.label, CallbackAction::Choice(o.key.to_string())))
        .collect()
}

/// Keyboard under an edit prompt: options for choice fields, then back.
pub fn edit_prompt(field: FieldKind) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::grid(choice_buttons(field), 3)
        .push_row(vec![button("⬅️ Назад", CallbackAction::Back)])
}

/// Keyboard under an add-dialog question; optional fields can be skipped.
pub fn add_prompt(field: FieldKind) -> InlineKeyboardMarkup {
    let mut last = Vec::new();
    if !field.is_required() {
        last.push(button("⏭ Пропустить", CallbackAction::Skip));
    }
    last.push(cancel_button());
    InlineKeyboardMarkup::grid(choice_buttons(field), 3).push_row(last)
}

pub fn confirm_add() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        button("💾 Сохранить", CallbackAction::Save),
        cancel_button(),
    ]])
}

pub fn confirm_delete() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        button("🗑 Да, удалить", CallbackAction::ConfirmDelete),
        button("⬅️ Нет", CallbackAction::Back),
    ]])
}

pub fn list_filters() -> InlineKeyboardMarkup {
    let buttons = [ListFilter::All, ListFilter::Candidates, ListFilter::Team]
        .into_iter()
        .map(|f| button(f.label(), CallbackAction::List(f)))
        .collect();
    InlineKeyboardMarkup::grid(buttons, 3).push_row(vec![button("⬅️ Меню", CallbackAction::Menu)])
}

pub fn schedule_ranges() -> InlineKeyboardMarkup {
    let buttons = [ScheduleRange::Today, ScheduleRange::Tomorrow, ScheduleRange::Week]
        .into_iter()
        .map(|r| button(r.label(), CallbackAction::Schedule(r)))
        .collect();
    InlineKeyboardMarkup::grid(buttons, 3).push_row(vec![
        button("🔄 Обновить", CallbackAction::RefreshSchedule),
        button("⬅️ Меню", CallbackAction::Menu),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_data(kb: &InlineKeyboardMarkup) -> Vec<String> {
        kb.buttons().map(|b| b.callback_data.clone()).collect()
    }

    #[test]
    fn test_every_button_parses() {
        let keyboards = vec![
            main_menu(),
            cancel_only(),
            participant_actions("rec123"),
            field_list(),
            edit_prompt(FieldKind::Department),
            add_prompt(FieldKind::Size),
            confirm_add(),
            confirm_delete(),
            list_filters(),
            schedule_ranges(),
        ];
        for kb in &keyboards {
            for data in all_data(kb) {
                assert!(CallbackAction::parse(&data).is_some(), "unparsable {}", data);
            }
        }
    }

    #[test]
    fn test_search_results_skip_unsaved() {
        let mut saved = Participant::new("Иван Иванов");
        saved.id = Some("rec1".to_string());
        let unsaved = Participant::new("Мария");
        let kb = search_results([&saved, &unsaved]);
        assert_eq!(all_data(&kb), vec!["sel:rec1", "menu"]);
        assert_eq!(kb.inline_keyboard[0][0].text, "Иван Иванов");
    }

    #[test]
    fn test_search_results_capped_for_busy_floor() {
        let people: Vec<Participant> = (0..150)
            .map(|i| {
                let mut p = Participant::new(format!("Участник {}", i));
                p.id = Some(format!("rec{}", i));
                p.floor = Some(2);
                p
            })
            .collect();
        let kb = search_results(&people);
        assert_eq!(kb.buttons().count(), MAX_RESULT_BUTTONS + 1);
        assert_eq!(kb.inline_keyboard[0][0].callback_data, "sel:rec0");
        assert_eq!(all_data(&kb).last().map(String::as_str), Some("menu"));
    }

    #[test]
    fn test_add_prompt_skip_only_when_optional() {
        let required = add_prompt(FieldKind::FullNameRu);
        assert!(!all_data(&required).contains(&"skip".to_string()));
        let optional = add_prompt(FieldKind::Church);
        assert!(all_data(&optional).contains(&"skip".to_string()));
    }

    #[test]
    fn test_field_list_covers_all_fields() {
        let kb = field_list();
        let fields = all_data(&kb).iter().filter(|d| d.starts_with("field:")).count();
        assert_eq!(fields, 15);
    }

    #[test]
    fn test_text_field_prompt_has_no_options() {
        let kb = edit_prompt(FieldKind::Notes);
        assert_eq!(all_data(&kb), vec!["back"]);
    }
}
