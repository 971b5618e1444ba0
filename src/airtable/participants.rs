//! Participant repositories: Airtable-backed and in-memory.

use std::cell::RefCell;

use super::client::{AirtableClient, Record};
use crate::error::{BotError, Result};
use crate::models::Participant;

/// CRUD access to participant records.
pub trait ParticipantRepository {
    /// Every participant, in storage order.
    fn list_all(&self) -> Result<Vec<Participant>>;

    fn get(&self, id: &str) -> Result<Option<Participant>>;

    /// Store a new participant and return it with its assigned id.
    fn create(&self, participant: &Participant) -> Result<Participant>;

    /// Overwrite all fields of an existing participant.
    fn update(&self, participant: &Participant) -> Result<Participant>;

    fn delete(&self, id: &str) -> Result<()>;

    /// Fetch by id or fail with `NotFound`.
    fn require(&self, id: &str) -> Result<Participant> {
        self.get(id)?.ok_or_else(|| BotError::NotFound(id.to_string()))
    }
}

fn from_record(record: Record<Participant>) -> Participant {
    let mut p = record.fields;
    p.id = Some(record.id);
    p
}

/// Decode raw rows, skipping (with a warning) any that do not fit the model,
/// e.g. a select option added in Airtable or a fractional amount.
fn decode_rows(records: Vec<Record<serde_json::Value>>) -> Vec<Participant> {
    records
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<Participant>(record.fields) {
            Ok(mut p) => {
                p.id = Some(record.id);
                Some(p)
            }
            Err(e) => {
                tracing::warn!(id = %record.id, "skipping participant row: {}", e);
                None
            }
        })
        .collect()
}

/// Participants stored in an Airtable table.
pub struct AirtableParticipants {
    client: AirtableClient,
    table: String,
}

impl AirtableParticipants {
    pub fn new(client: AirtableClient, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }
}

impl ParticipantRepository for AirtableParticipants {
    fn list_all(&self) -> Result<Vec<Participant>> {
        let records = self.client.list_records::<serde_json::Value>(&self.table)?;
        Ok(decode_rows(records))
    }

    fn get(&self, id: &str) -> Result<Option<Participant>> {
        Ok(self
            .client
            .get_record::<Participant>(&self.table, id)?
            .map(from_record))
    }

    fn create(&self, participant: &Participant) -> Result<Participant> {
        let record = self.client.create_record(&self.table, participant)?;
        tracing::info!(id = %record.id, name = %participant.full_name_ru, "created participant");
        Ok(from_record(record))
    }

    fn update(&self, participant: &Participant) -> Result<Participant> {
        let id = participant
            .id
            .as_deref()
            .ok_or_else(|| BotError::NotFound("participant without id".to_string()))?;
        let record = self.client.update_record(&self.table, id, participant)?;
        tracing::info!(id = %record.id, "updated participant");
        Ok(from_record(record))
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.client.delete_record(&self.table, id)?;
        tracing::info!(id, "deleted participant");
        Ok(())
    }
}

/// Participants held in memory (tests, dry runs).
#[derive(Default)]
pub struct InMemoryParticipants {
    records: RefCell<Vec<Participant>>,
    next_id: RefCell<u32>,
}

impl InMemoryParticipants {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with participants; missing ids are assigned.
    pub fn with(participants: Vec<Participant>) -> Self {
        let repo = Self::new();
        for p in participants {
            let p = if p.id.is_some() { p } else { repo.assign_id(p) };
            repo.records.borrow_mut().push(p);
        }
        repo
    }

    fn assign_id(&self, mut p: Participant) -> Participant {
        let mut next = self.next_id.borrow_mut();
        *next += 1;
        p.id = Some(format!("rec{:03}", *next));
        p
    }
}

impl ParticipantRepository for InMemoryParticipants {
    fn list_all(&self) -> Result<Vec<Participant>> {
        Ok(self.records.borrow().clone())
    }

    fn get(&self, id: &str) -> Result<Option<Participant>> {
        Ok(self
            .records
            .borrow()
            .iter()
            .find(|p| p.id.as_deref() == Some(id))
            .cloned())
    }

    fn create(&self, participant: &Participant) -> Result<Participant> {
        let stored = self.assign_id(Participant {
            id: None,
            ..participant.clone()
        });
        self.records.borrow_mut().push(stored.clone());
        Ok(stored)
    }

    fn update(&self, participant: &Participant) -> Result<Participant> {
        let id = participant.id.clone().unwrap_or_default();
        let mut records = self.records.borrow_mut();
        let slot = records
            .iter_mut()
            .find(|p| p.id.as_deref() == Some(id.as_str()))
            .ok_or_else(|| BotError::NotFound(id.clone()))?;
        *slot = participant.clone();
        Ok(participant.clone())
    }

    fn delete(&self, id: &str) -> Result<()> {
        let mut records = self.records.borrow_mut();
        let before = records.len();
        records.retain(|p| p.id.as_deref() != Some(id));
        if records.len() == before {
            return Err(BotError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
