//! Stats command.

use anyhow::{Context, Result};

use super::{load_settings, repositories};
use crate::airtable::ParticipantRepository;
use crate::output::OutputControls;
use crate::stats::Statistics;

/// Plain-text rendering for the terminal.
pub fn render(stats: &Statistics) -> String {
    let mut lines = vec![
        format!("Total:        {}", stats.total),
        format!("Candidates:   {}", stats.candidates),
        format!("Team:         {}", stats.team),
        format!("Men / women:  {} / {}", stats.men, stats.women),
        String::new(),
        format!(
            "Payments:     {} paid, {} partial, {} unpaid ({} total)",
            stats.paid, stats.partially_paid, stats.unpaid, stats.total_payments
        ),
        format!("Rooms:        {} assigned, {} without", stats.with_room, stats.without_room),
    ];

    if !stats.team_by_department.is_empty() || stats.team_without_department > 0 {
        lines.push(String::new());
        lines.push("Team by department:".to_string());
        for (dept, count) in &stats.team_by_department {
            lines.push(format!("  {:<16} {}", dept, count));
        }
        if stats.team_without_department > 0 {
            lines.push(format!("  {:<16} {}", "(none)", stats.team_without_department));
        }
    }

    if !stats.by_floor.is_empty() {
        lines.push(String::new());
        lines.push("By floor:".to_string());
        for (floor, count) in &stats.by_floor {
            lines.push(format!("  floor {:<10} {}", floor, count));
        }
    }
    lines.join("\n")
}

/// Print participant statistics.
pub fn run(output: &OutputControls) -> Result<()> {
    let settings = load_settings()?;
    let (repo, _) = repositories(&settings)?;
    let participants = repo.list_all().context("Failed to load participants")?;
    let stats = Statistics::collect(&participants);

    if output.json {
        output.print(&stats);
    } else {
        println!("{}", render(&stats));
    }
    Ok(())
}
