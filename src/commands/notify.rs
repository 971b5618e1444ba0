//! Notify command: send the daily report right away.

use anyhow::{Context, Result};
use chrono::NaiveDate;

use super::{load_settings, repositories};
use crate::airtable::ParticipantRepository;
use crate::bot::format::format_daily_report;
use crate::bot::server::POLL_TIMEOUT;
use crate::output::OutputControls;
use crate::stats::Statistics;
use crate::telegram::{BotApi, Messenger};

/// Send the daily report to every `NOTIFY_CHAT_IDS` chat.
///
/// With `dry_run` the report is printed instead of sent.
pub fn run(date: Option<NaiveDate>, dry_run: bool, output: &OutputControls) -> Result<()> {
    let settings = load_settings()?;
    let (repo, _) = repositories(&settings)?;
    let participants = repo.list_all().context("Failed to load participants")?;

    let date = date.unwrap_or_else(|| chrono::Utc::now().with_timezone(&settings.utc_offset).date_naive());
    let report = format_daily_report(&Statistics::collect(&participants), date);

    if dry_run {
        if output.json {
            output.print(&serde_json::json!({ "date": date, "chats": settings.notify_chat_ids, "report": report }));
        } else {
            println!("{}", report);
        }
        return Ok(());
    }

    if settings.notify_chat_ids.is_empty() {
        anyhow::bail!("NOTIFY_CHAT_IDS is empty; nothing to send");
    }

    let api = BotApi::new(settings.telegram_token()?, POLL_TIMEOUT).context("Failed to create Telegram client")?;
    let mut delivered = Vec::new();
    let mut failed = Vec::new();
    for chat_id in &settings.notify_chat_ids {
        match api.send_text(*chat_id, &report, None) {
            Ok(()) => delivered.push(*chat_id),
            Err(e) => {
                tracing::warn!(chat_id, "daily report not delivered: {}", e);
                failed.push(*chat_id);
            }
        }
    }

    if output.json {
        output.print(&serde_json::json!({
            "success": failed.is_empty(),
            "date": date,
            "delivered": delivered,
            "failed": failed,
        }));
    } else {
        println!("Report for {} sent to {} chat(s)", date, delivered.len());
        if !failed.is_empty() {
            println!("Failed: {:?}", failed);
        }
    }
    Ok(())
}
