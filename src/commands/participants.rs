//! Participant commands: list, show, export.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::{load_settings, repositories, text_line, ParticipantRow};
use crate::airtable::ParticipantRepository;
use crate::bot::fields::FieldKind;
use crate::bot::state::ListFilter;
use crate::export::{export_file_name, participants_to_csv};
use crate::models::Participant;
use crate::output::OutputControls;

/// Participants passing `filter`, sorted by name.
pub fn filtered(participants: &[Participant], filter: ListFilter) -> Vec<&Participant> {
    let mut selected: Vec<&Participant> = participants.iter().filter(|p| filter.matches(p)).collect();
    selected.sort_by(|a, b| a.full_name_ru.cmp(&b.full_name_ru));
    selected
}

/// List participants.
pub fn list(role: &str, output: &OutputControls) -> Result<()> {
    let filter = ListFilter::from_key(role)
        .with_context(|| format!("Unknown role filter '{}': use all, candidates or team", role))?;
    let settings = load_settings()?;
    let (repo, _) = repositories(&settings)?;
    let participants = repo.list_all().context("Failed to load participants")?;
    let selected = filtered(&participants, filter);

    if output.json {
        let rows: Vec<ParticipantRow> = selected.iter().map(|p| ParticipantRow::from(*p)).collect();
        output.print(&rows);
        return Ok(());
    }

    println!("{} ({}):", filter.label(), selected.len());
    println!("{}", "-".repeat(50));
    for p in selected {
        println!("{}", output.clip(&text_line(p)));
    }
    Ok(())
}

/// Show one participant with every populated field.
pub fn show(id: &str, output: &OutputControls) -> Result<()> {
    let settings = load_settings()?;
    let (repo, _) = repositories(&settings)?;
    let p = repo
        .require(id)
        .with_context(|| format!("Failed to load participant {}", id))?;

    if output.json {
        output.print(&serde_json::json!({ "id": p.id, "fields": p }));
        return Ok(());
    }

    println!("{}", p.display_name());
    println!("{}", "-".repeat(50));
    for kind in FieldKind::all() {
        if let Some(value) = kind.display(&p) {
            println!("{:<16} {}", kind.label(), output.clip(&value));
        }
    }
    Ok(())
}

/// Resolve the export target: a directory gets a generated file name.
pub fn export_path(requested: Option<&Path>, today: chrono::NaiveDate) -> PathBuf {
    match requested {
        Some(path) if path.is_dir() => path.join(export_file_name(today)),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(export_file_name(today)),
    }
}

/// Write all participants to a CSV file.
pub fn export(path: Option<&Path>, output: &OutputControls) -> Result<()> {
    let settings = load_settings()?;
    let (repo, _) = repositories(&settings)?;
    let participants = repo.list_all().context("Failed to load participants")?;

    let today = chrono::Utc::now().with_timezone(&settings.utc_offset).date_naive();
    let target = export_path(path, today);
    let csv = participants_to_csv(&participants).context("Failed to render CSV")?;
    std::fs::write(&target, csv)
        .with_context(|| format!("Failed to write {:?}", target))?;
    tracing::info!(rows = participants.len(), path = %target.display(), "export written");

    if output.json {
        output.print(&serde_json::json!({
            "success": true,
            "path": target.display().to_string(),
            "rows": participants.len(),
        }));
    } else {
        println!("Exported {} participants to {}", participants.len(), target.display());
    }
    Ok(())
}
