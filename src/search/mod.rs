//! Participant search: fuzzy by name, exact by room or floor.

pub mod fuzzy;
pub mod quality;
pub mod ranker;

pub use quality::MatchQuality;
pub use ranker::{rank, SearchOptions, SearchResult, Searchable};

use crate::models::Participant;

/// Participants in `room` (trimmed, case-insensitive), sorted by name.
pub fn find_by_room<'a>(participants: &'a [Participant], room: &str) -> Vec<&'a Participant> {
    let wanted = fuzzy::normalize(room.trim());
    if wanted.is_empty() {
        return Vec::new();
    }
    let mut found: Vec<&Participant> = participants
        .iter()
        .filter(|p| {
            p.room_number
                .as_deref()
                .map(|r| fuzzy::normalize(r.trim()) == wanted)
                .unwrap_or(false)
        })
        .collect();
    found.sort_by(|a, b| a.full_name_ru.cmp(&b.full_name_ru));
    found
}

/// Participants on `floor`, sorted by room then name.
pub fn find_by_floor(participants: &[Participant], floor: u32) -> Vec<&Participant> {
    let mut found: Vec<&Participant> = participants
        .iter()
        .filter(|p| p.floor == Some(floor))
        .collect();
    found.sort_by(|a, b| {
        let room_a = a.room_number.as_deref().unwrap_or("");
        let room_b = b.room_number.as_deref().unwrap_or("");
        room_a
            .cmp(room_b)
            .then_with(|| a.full_name_ru.cmp(&b.full_name_ru))
    });
    found
}
