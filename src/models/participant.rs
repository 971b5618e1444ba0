//! Participant record as stored in the Airtable "Participants" table.

use serde::{Deserialize, Serialize};

use crate::search::ranker::Searchable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    M,
    F,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::M, Gender::F];

    pub fn key(self) -> &'static str {
        match self {
            Gender::M => "M",
            Gender::F => "F",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Gender::M => "Мужской",
            Gender::F => "Женский",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.key().eq_ignore_ascii_case(key))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Size {
    XS,
    S,
    M,
    L,
    XL,
    XXL,
    #[serde(rename = "3XL")]
    XXXL,
}

impl Size {
    pub const ALL: [Size; 7] = [
        Size::XS,
        Size::S,
        Size::M,
        Size::L,
        Size::XL,
        Size::XXL,
        Size::XXXL,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Size::XS => "XS",
            Size::S => "S",
            Size::M => "M",
            Size::L => "L",
            Size::XL => "XL",
            Size::XXL => "XXL",
            Size::XXXL => "3XL",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.key().eq_ignore_ascii_case(key))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    Candidate,
    Team,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Candidate, Role::Team];

    pub fn key(self) -> &'static str {
        match self {
            Role::Candidate => "CANDIDATE",
            Role::Team => "TEAM",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Candidate => "Кандидат",
            Role::Team => "Команда",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.key().eq_ignore_ascii_case(key))
    }
}

/// Service department of a team member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Department {
    #[serde(rename = "ROE")]
    Roe,
    Chapel,
    Setup,
    Palanka,
    Administration,
    Kitchen,
    Decoration,
    Bell,
    Refreshment,
    Worship,
    Media,
    Clergy,
    Rectorate,
}

impl Department {
    pub const ALL: [Department; 13] = [
        Department::Roe,
        Department::Chapel,
        Department::Setup,
        Department::Palanka,
        Department::Administration,
        Department::Kitchen,
        Department::Decoration,
        Department::Bell,
        Department::Refreshment,
        Department::Worship,
        Department::Media,
        Department::Clergy,
        Department::Rectorate,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Department::Roe => "ROE",
            Department::Chapel => "Chapel",
            Department::Setup => "Setup",
            Department::Palanka => "Palanka",
            Department::Administration => "Administration",
            Department::Kitchen => "Kitchen",
            Department::Decoration => "Decoration",
            Department::Bell => "Bell",
            Department::Refreshment => "Refreshment",
            Department::Worship => "Worship",
            Department::Media => "Media",
            Department::Clergy => "Clergy",
            Department::Rectorate => "Rectorate",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Department::Roe => "РОЕ",
            Department::Chapel => "Капелла",
            Department::Setup => "Сетап",
            Department::Palanka => "Паланка",
            Department::Administration => "Администрация",
            Department::Kitchen => "Кухня",
            Department::Decoration => "Декорации",
            Department::Bell => "Колокольчик",
            Department::Refreshment => "Рефрешмент",
            Department::Worship => "Прославление",
            Department::Media => "Медиа",
            Department::Clergy => "Духовенство",
            Department::Rectorate => "Ректорат",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.key().eq_ignore_ascii_case(key))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Paid,
    Partial,
    #[default]
    Unpaid,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 3] = [
        PaymentStatus::Paid,
        PaymentStatus::Partial,
        PaymentStatus::Unpaid,
    ];

    pub fn key(self) -> &'static str {
        match self {
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Partial => "Partial",
            PaymentStatus::Unpaid => "Unpaid",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PaymentStatus::Paid => "Оплачено",
            PaymentStatus::Partial => "Частично",
            PaymentStatus::Unpaid => "Не оплачено",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key().eq_ignore_ascii_case(key))
    }
}

/// One event participant.
///
/// Field names follow the Airtable column names. `None` serializes as `null`,
/// which clears the cell on PATCH.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    /// Airtable record id; `None` until the record is created.
    #[serde(skip)]
    pub id: Option<String>,
    #[serde(rename = "FullNameRU", default)]
    pub full_name_ru: String,
    #[serde(rename = "FullNameEN", default)]
    pub full_name_en: Option<String>,
    #[serde(rename = "Gender", default)]
    pub gender: Option<Gender>,
    #[serde(rename = "Size", default)]
    pub size: Option<Size>,
    #[serde(rename = "Church", default)]
    pub church: Option<String>,
    #[serde(rename = "Role", default)]
    pub role: Role,
    #[serde(rename = "Department", default)]
    pub department: Option<Department>,
    #[serde(rename = "CountryAndCity", default)]
    pub country_and_city: Option<String>,
    #[serde(rename = "SubmittedBy", default)]
    pub submitted_by: Option<String>,
    #[serde(rename = "ContactInformation", default)]
    pub contact_information: Option<String>,
    #[serde(rename = "Floor", default)]
    pub floor: Option<u32>,
    #[serde(rename = "RoomNumber", default)]
    pub room_number: Option<String>,
    #[serde(rename = "PaymentStatus", default)]
    pub payment_status: PaymentStatus,
    #[serde(rename = "PaymentAmount", default)]
    pub payment_amount: Option<u32>,
    #[serde(rename = "Notes", default)]
    pub notes: Option<String>,
}

impl Participant {
    pub fn new(full_name_ru: impl Into<String>) -> Self {
        Self {
            full_name_ru: full_name_ru.into(),
            ..Default::default()
        }
    }

    /// Name for lists and headers: Russian name, else English, else the id.
    pub fn display_name(&self) -> &str {
        if !self.full_name_ru.trim().is_empty() {
            return &self.full_name_ru;
        }
        match (&self.full_name_en, &self.id) {
            (Some(en), _) if !en.trim().is_empty() => en,
            (_, Some(id)) => id,
            _ => "—",
        }
    }

    pub fn has_room(&self) -> bool {
        self.room_number
            .as_deref()
            .map(|r| !r.trim().is_empty())
            .unwrap_or(false)
    }
}

impl Searchable for Participant {
    fn name_fields(&self) -> Vec<Option<&str>> {
        vec![Some(self.full_name_ru.as_str()), self.full_name_en.as_deref()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_airtable_fields() {
        let json = r#"{
            "FullNameRU": "Иван Иванов",
            "Gender": "M",
            "Size": "3XL",
            "Role": "TEAM",
            "Department": "ROE",
            "Floor": 2,
            "RoomNumber": "203",
            "PaymentStatus": "Partial",
            "PaymentAmount": 5000
        }"#;
        let p: Participant = serde_json::from_str(json).unwrap();
        assert_eq!(p.full_name_ru, "Иван Иванов");
        assert_eq!(p.gender, Some(Gender::M));
        assert_eq!(p.size, Some(Size::XXXL));
        assert_eq!(p.role, Role::Team);
        assert_eq!(p.department, Some(Department::Roe));
        assert_eq!(p.floor, Some(2));
        assert_eq!(p.payment_status, PaymentStatus::Partial);
        assert_eq!(p.payment_amount, Some(5000));
        assert!(p.id.is_none());
    }

    #[test]
    fn test_missing_fields_default() {
        let p: Participant = serde_json::from_str(r#"{"FullNameRU": "Анна"}"#).unwrap();
        assert_eq!(p.role, Role::Candidate);
        assert_eq!(p.payment_status, PaymentStatus::Unpaid);
        assert!(p.gender.is_none());
        assert!(!p.has_room());
    }

    #[test]
    fn test_serialize_clears_with_null() {
        let p = Participant::new("Анна");
        let value = serde_json::to_value(&p).unwrap();
        assert_eq!(value["FullNameRU"], "Анна");
        assert!(value["RoomNumber"].is_null());
        assert_eq!(value["Role"], "CANDIDATE");
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_display_name_fallback() {
        let mut p = Participant::new("");
        p.full_name_en = Some("Anna".to_string());
        assert_eq!(p.display_name(), "Anna");
        p.full_name_en = None;
        p.id = Some("rec1".to_string());
        assert_eq!(p.display_name(), "rec1");
    }

    #[test]
    fn test_from_key_case_insensitive() {
        assert_eq!(Role::from_key("team"), Some(Role::Team));
        assert_eq!(Department::from_key("kitchen"), Some(Department::Kitchen));
        assert_eq!(Size::from_key("3xl"), Some(Size::XXXL));
        assert_eq!(PaymentStatus::from_key("nope"), None);
    }
}
