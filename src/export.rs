//! CSV export of participant records.

use chrono::NaiveDate;
use csv::{Terminator, WriterBuilder};

use crate::error::Result;
use crate::models::Participant;

/// Column headers, matching the Airtable field names.
pub const CSV_HEADERS: [&str; 17] = [
    "id",
    "FullNameRU",
    "FullNameEN",
    "Gender",
    "Size",
    "Church",
    "Role",
    "Department",
    "CountryAndCity",
    "SubmittedBy",
    "ContactInformation",
    "Floor",
    "RoomNumber",
    "PaymentStatus",
    "PaymentAmount",
    "Notes",
    "RoleLabel",
];

const BOM: &[u8] = b"\xEF\xBB\xBF";

fn row(p: &Participant) -> Vec<String> {
    let opt = |v: &Option<String>| v.clone().unwrap_or_default();
    vec![
        opt(&p.id),
        p.full_name_ru.clone(),
        opt(&p.full_name_en),
        p.gender.map(|g| g.key().to_string()).unwrap_or_default(),
        p.size.map(|s| s.key().to_string()).unwrap_or_default(),
        opt(&p.church),
        p.role.key().to_string(),
        p.department.map(|d| d.key().to_string()).unwrap_or_default(),
        opt(&p.country_and_city),
        opt(&p.submitted_by),
        opt(&p.contact_information),
        p.floor.map(|f| f.to_string()).unwrap_or_default(),
        opt(&p.room_number),
        p.payment_status.key().to_string(),
        p.payment_amount.map(|a| a.to_string()).unwrap_or_default(),
        opt(&p.notes),
        p.role.label().to_string(),
    ]
}

/// Render participants as CSV (UTF-8 with BOM, CRLF line endings).
pub fn participants_to_csv(participants: &[Participant]) -> Result<Vec<u8>> {
    let mut w = WriterBuilder::new()
        .terminator(Terminator::CRLF)
        .from_writer(BOM.to_vec());
    w.write_record(CSV_HEADERS)?;
    for p in participants {
        w.write_record(row(p))?;
    }
    w.into_inner().map_err(|e| e.into_error().into())
}

/// `participants_YYYY-MM-DD_<8 hex>.csv`
pub fn export_file_name(date: NaiveDate) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("participants_{}_{}.csv", date.format("%Y-%m-%d"), &suffix[..8])
}
