//! Russian HTML rendering of bot replies.

use chrono::NaiveDate;

use crate::bot::fields::FieldKind;
use crate::bot::state::ListFilter;
use crate::models::{Participant, Role, ScheduleEvent};
use crate::search::{MatchQuality, SearchResult};
use crate::stats::Statistics;

pub const MENU_TEXT: &str = "👋 <b>Участники мероприятия</b>\nВыберите действие:";

pub const HELP_TEXT: &str = "<b>Команды</b>\n\
/search &lt;имя&gt;: поиск по имени\n\
/room &lt;номер&gt;: кто живёт в комнате\n\
/floor &lt;этаж&gt;: кто живёт на этаже\n\
/list [все|кандидаты|команда]: списки\n\
/add: добавить участника\n\
/export: выгрузка в CSV\n\
/stats: статистика\n\
/schedule [сегодня|завтра|неделя]: расписание\n\
/cancel: отменить текущее действие\n\n\
Можно просто отправить имя, чтобы найти участника.";

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

fn role_icon(role: Role) -> &'static str {
    match role {
        Role::Candidate => "🙋",
        Role::Team => "🛠",
    }
}

/// Full card with every populated field.
pub fn participant_card(p: &Participant) -> String {
    let mut lines = vec![format!(
        "{} <b>{}</b>",
        role_icon(p.role),
        escape_html(p.display_name())
    )];
    for kind in FieldKind::all().filter(|k| *k != FieldKind::FullNameRu) {
        if let Some(value) = kind.display(p) {
            lines.push(format!("{}: {}", kind.label(), escape_html(&value)));
        }
    }
    lines.join("\n")
}

/// One-line summary used in lists.
pub fn participant_line(p: &Participant) -> String {
    let mut line = escape_html(p.display_name());
    if let Some(d) = p.department {
        line.push_str(&format!(" · {}", d.label()));
    }
    match (p.floor, p.room_number.as_deref().filter(|r| !r.trim().is_empty())) {
        (_, Some(room)) => line.push_str(&format!(" · комн. {}", escape_html(room))),
        (Some(floor), None) => line.push_str(&format!(" · эт. {}", floor)),
        (None, None) => {}
    }
    line
}

pub fn search_results(query: &str, results: &[SearchResult<'_, Participant>]) -> String {
    if results.is_empty() {
        return format!(
            "По запросу «{}» никого не найдено. Попробуйте другое написание.",
            escape_html(query)
        );
    }
    let mut lines = vec![format!("🔍 Результаты по запросу «{}»:", escape_html(query)), String::new()];
    for (i, r) in results.iter().enumerate() {
        let quality = MatchQuality::from_score(r.score);
        lines.push(format!(
            "{}. {} {} ({}, {:.0}%)",
            i + 1,
            quality.emoji(),
            participant_line(r.item),
            quality.label(),
            r.score * 100.0
        ));
    }
    lines.push(String::new());
    lines.push("Выберите участника:".to_string());
    lines.join("\n")
}

/// Titled list with a count; `empty` is shown when nobody matched.
pub fn participant_list(title: &str, participants: &[&Participant], empty: &str) -> String {
    if participants.is_empty() {
        return empty.to_string();
    }
    let mut lines = vec![format!("<b>{}</b> ({})", escape_html(title), participants.len())];
    for (i, p) in participants.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, participant_line(p)));
    }
    lines.join("\n")
}

/// List for a filter. Team members are grouped by department.
pub fn filtered_list(filter: ListFilter, participants: &[Participant]) -> String {
    let mut selected: Vec<&Participant> = participants.iter().filter(|p| filter.matches(p)).collect();
    selected.sort_by(|a, b| a.full_name_ru.cmp(&b.full_name_ru));

    if filter != ListFilter::Team {
        return participant_list(filter.label(), &selected, "Список пуст.");
    }
    if selected.is_empty() {
        return "В команде пока никого нет.".to_string();
    }

    selected.sort_by(|a, b| {
        a.department
            .is_none()
            .cmp(&b.department.is_none())
            .then(a.department.cmp(&b.department))
            .then_with(|| a.full_name_ru.cmp(&b.full_name_ru))
    });
    let mut lines = vec![format!("<b>{}</b> ({})", filter.label(), selected.len())];
    let mut current = None;
    for p in selected {
        if current != Some(p.department) {
            current = Some(p.department);
            let heading = p.department.map(|d| d.label()).unwrap_or("Без департамента");
            lines.push(String::new());
            lines.push(format!("<b>{}</b>", heading));
        }
        lines.push(format!("• {}", escape_html(p.display_name())));
    }
    lines.join("\n")
}

pub fn statistics(stats: &Statistics) -> String {
    let mut lines = vec![
        "📊 <b>Статистика</b>".to_string(),
        String::new(),
        format!("Всего: <b>{}</b>", stats.total),
        format!("Кандидаты: {}", stats.candidates),
        format!("Команда: {}", stats.team),
        format!("Мужчины: {} · Женщины: {}", stats.men, stats.women),
    ];

    if !stats.team_by_department.is_empty() || stats.team_without_department > 0 {
        lines.push(String::new());
        lines.push("<b>Команда по департаментам</b>".to_string());
        for (name, count) in &stats.team_by_department {
            lines.push(format!("• {}: {}", escape_html(name), count));
        }
        if stats.team_without_department > 0 {
            lines.push(format!("• Без департамента: {}", stats.team_without_department));
        }
    }

    lines.push(String::new());
    lines.push("<b>Оплата</b>".to_string());
    lines.push(format!(
        "Оплачено: {} · Частично: {} · Не оплачено: {}",
        stats.paid, stats.partially_paid, stats.unpaid
    ));
    lines.push(format!("Сумма: {}", group_thousands(stats.total_payments)));

    lines.push(String::new());
    lines.push("<b>Расселение</b>".to_string());
    lines.push(format!(
        "С комнатой: {} · Без комнаты: {}",
        stats.with_room, stats.without_room
    ));
    for (floor, count) in &stats.by_floor {
        lines.push(format!("• {} этаж: {}", floor, count));
    }
    lines.join("\n")
}

pub fn schedule(title: &str, events: &[ScheduleEvent]) -> String {
    if events.is_empty() {
        return format!("📅 {}: событий нет.", escape_html(title));
    }
    let mut lines = vec![format!("📅 <b>{}</b>", escape_html(title))];
    let mut current_date = None;
    for e in events {
        if current_date != Some(e.date) {
            current_date = Some(e.date);
            lines.push(String::new());
            lines.push(format!("<b>{}</b>", e.date.format("%d.%m.%Y")));
        }
        let time = match (e.start_time.as_deref(), e.end_time.as_deref()) {
            (Some(start), Some(end)) => format!("{}-{}", start, end),
            (Some(start), None) => start.to_string(),
            _ => "--:--".to_string(),
        };
        let mut line = format!("{} {}", escape_html(&time), escape_html(&e.title));
        if let Some(loc) = e.location.as_deref().filter(|l| !l.is_empty()) {
            line.push_str(&format!(" ({})", escape_html(loc)));
        }
        lines.push(line);
    }
    lines.join("\n")
}

/// Evening summary sent to the notification chats.
pub fn format_daily_report(stats: &Statistics, date: NaiveDate) -> String {
    format!(
        "🌙 <b>Сводка на {}</b>\n\n{}",
        date.format("%d.%m.%Y"),
        statistics(stats)
    )
}

/// `1234567` -> `1 234 567`
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}
