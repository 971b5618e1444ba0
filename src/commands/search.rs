//! Search commands: search, room, floor.

use anyhow::{Context, Result};
use serde::Serialize;

use super::{load_settings, repositories, text_line, ParticipantRow};
use crate::airtable::ParticipantRepository;
use crate::models::Participant;
use crate::output::OutputControls;
use crate::search::{self, rank, MatchQuality, SearchOptions};

#[derive(Debug, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub participant: ParticipantRow,
    pub score: f64,
    pub quality: &'static str,
}

/// Rank `participants` against `query` and flatten the results for output.
pub fn hits(query: &str, participants: &[Participant], options: SearchOptions) -> Vec<SearchHit> {
    rank(query, participants, options)
        .into_iter()
        .map(|r| SearchHit {
            participant: ParticipantRow::from(r.item),
            score: (r.score * 1000.0).round() / 1000.0,
            quality: MatchQuality::from_score(r.score).label(),
        })
        .collect()
}

/// Fuzzy search by name.
pub fn name(
    query: &str,
    threshold: Option<f64>,
    limit: Option<usize>,
    output: &OutputControls,
) -> Result<()> {
    let settings = load_settings()?;
    let (repo, _) = repositories(&settings)?;
    let participants = repo.list_all().context("Failed to load participants")?;

    let options = SearchOptions::new(
        threshold.unwrap_or(settings.search.threshold),
        limit.unwrap_or(settings.search.limit),
    );
    let results = hits(query, &participants, options);

    if output.json {
        output.print(&results);
        return Ok(());
    }
    if results.is_empty() {
        println!("No participants match '{}'.", query);
        return Ok(());
    }
    for (i, hit) in results.iter().enumerate() {
        println!(
            "{}. {} ({:.0}%, {})  ({})",
            i + 1,
            output.clip(&hit.participant.name),
            hit.score * 100.0,
            hit.quality,
            hit.participant.id.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

fn print_list(found: &[&Participant], empty: &str, output: &OutputControls) {
    if output.json {
        let rows: Vec<ParticipantRow> = found.iter().map(|p| ParticipantRow::from(*p)).collect();
        output.print(&rows);
        return;
    }
    if found.is_empty() {
        println!("{}", empty);
        return;
    }
    for p in found {
        println!("{}", output.clip(&text_line(p)));
    }
}

/// Who lives in `room`.
pub fn room(room: &str, output: &OutputControls) -> Result<()> {
    let settings = load_settings()?;
    let (repo, _) = repositories(&settings)?;
    let participants = repo.list_all().context("Failed to load participants")?;
    let found = search::find_by_room(&participants, room);
    print_list(&found, &format!("Nobody in room {}.", room), output);
    Ok(())
}

/// Who lives on `floor`.
pub fn floor(floor: u32, output: &OutputControls) -> Result<()> {
    let settings = load_settings()?;
    let (repo, _) = repositories(&settings)?;
    let participants = repo.list_all().context("Failed to load participants")?;
    let found = search::find_by_floor(&participants, floor);
    print_list(&found, &format!("Nobody on floor {}.", floor), output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hits_rounded_and_labelled() {
        let mut a = Participant::new("Иван Иванов");
        a.id = Some("rec1".to_string());
        let b = Participant::new("Мария Петрова");
        let found = hits("Иванов Иван", &[a, b], SearchOptions::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].score, 1.0);
        assert_eq!(found[0].quality, "точное совпадение");
        let v = serde_json::to_value(&found[0]).unwrap();
        assert_eq!(v["id"], "rec1");
        assert_eq!(v["name"], "Иван Иванов");
    }
}
