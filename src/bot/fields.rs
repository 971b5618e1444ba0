//! Editable participant fields.
//!
//! Every field has one entry in [`FIELDS`] describing how user input is
//! validated and converted. Text fields carry a parser; choice fields carry
//! their option list and are offered as buttons.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

use crate::models::{Department, Gender, Participant, PaymentStatus, Role, Size};
use crate::search::fuzzy;

/// Typed in by users to clear an optional field.
pub const CLEAR_MARKER: &str = "-";

/// Choice key that clears an optional choice field.
pub const NONE_KEY: &str = "none";

const MAX_FLOOR: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvalidInput(pub String);

fn invalid(msg: impl Into<String>) -> InvalidInput {
    InvalidInput(msg.into())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    FullNameRu,
    FullNameEn,
    Gender,
    Size,
    Church,
    Role,
    Department,
    CountryAndCity,
    SubmittedBy,
    ContactInformation,
    Floor,
    RoomNumber,
    PaymentStatus,
    PaymentAmount,
    Notes,
}

/// A parsed value, ready to be written into a participant.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    FullNameRu(String),
    FullNameEn(Option<String>),
    Gender(Option<Gender>),
    Size(Option<Size>),
    Church(Option<String>),
    Role(Role),
    Department(Option<Department>),
    CountryAndCity(Option<String>),
    SubmittedBy(Option<String>),
    ContactInformation(Option<String>),
    Floor(Option<u32>),
    RoomNumber(Option<String>),
    PaymentStatus(PaymentStatus),
    PaymentAmount(Option<u32>),
    Notes(Option<String>),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::FullNameRu(_) => FieldKind::FullNameRu,
            FieldValue::FullNameEn(_) => FieldKind::FullNameEn,
            FieldValue::Gender(_) => FieldKind::Gender,
            FieldValue::Size(_) => FieldKind::Size,
            FieldValue::Church(_) => FieldKind::Church,
            FieldValue::Role(_) => FieldKind::Role,
            FieldValue::Department(_) => FieldKind::Department,
            FieldValue::CountryAndCity(_) => FieldKind::CountryAndCity,
            FieldValue::SubmittedBy(_) => FieldKind::SubmittedBy,
            FieldValue::ContactInformation(_) => FieldKind::ContactInformation,
            FieldValue::Floor(_) => FieldKind::Floor,
            FieldValue::RoomNumber(_) => FieldKind::RoomNumber,
            FieldValue::PaymentStatus(_) => FieldKind::PaymentStatus,
            FieldValue::PaymentAmount(_) => FieldKind::PaymentAmount,
            FieldValue::Notes(_) => FieldKind::Notes,
        }
    }

    /// Write into `p`. Switching a participant to candidate drops the department.
    pub fn apply(self, p: &mut Participant) {
        match self {
            FieldValue::FullNameRu(v) => p.full_name_ru = v,
            FieldValue::FullNameEn(v) => p.full_name_en = v,
            FieldValue::Gender(v) => p.gender = v,
            FieldValue::Size(v) => p.size = v,
            FieldValue::Church(v) => p.church = v,
            FieldValue::Role(v) => {
                p.role = v;
                if v == Role::Candidate {
                    p.department = None;
                }
            }
            FieldValue::Department(v) => p.department = v,
            FieldValue::CountryAndCity(v) => p.country_and_city = v,
            FieldValue::SubmittedBy(v) => p.submitted_by = v,
            FieldValue::ContactInformation(v) => p.contact_information = v,
            FieldValue::Floor(v) => p.floor = v,
            FieldValue::RoomNumber(v) => p.room_number = v,
            FieldValue::PaymentStatus(v) => p.payment_status = v,
            FieldValue::PaymentAmount(v) => p.payment_amount = v,
            FieldValue::Notes(v) => p.notes = v,
        }
    }
}

/// One selectable option of a choice field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceOption {
    pub key: &'static str,
    pub label: &'static str,
}

pub enum FieldInput {
    Text {
        required: bool,
        hint: &'static str,
        parse: fn(&str) -> Result<FieldValue, InvalidInput>,
    },
    Choice {
        options: fn() -> Vec<ChoiceOption>,
        select: fn(&str) -> Option<FieldValue>,
    },
}

pub struct FieldSpec {
    pub kind: FieldKind,
    /// Stable key used in callback data.
    pub key: &'static str,
    pub label: &'static str,
    pub input: FieldInput,
}

pub static FIELDS: [FieldSpec; 15] = [
    FieldSpec {
        kind: FieldKind::FullNameRu,
        key: "name_ru",
        label: "Имя (рус.)",
        input: FieldInput::Text {
            required: true,
            hint: "Фамилия и имя на русском",
            parse: |s| person_name(s).map(FieldValue::FullNameRu),
        },
    },
    FieldSpec {
        kind: FieldKind::FullNameEn,
        key: "name_en",
        label: "Имя (англ.)",
        input: FieldInput::Text {
            required: false,
            hint: "Full name in English",
            parse: |s| person_name(s).map(|v| FieldValue::FullNameEn(Some(v))),
        },
    },
    FieldSpec {
        kind: FieldKind::Gender,
        key: "gender",
        label: "Пол",
        input: FieldInput::Choice {
            options: || {
                Gender::ALL
                    .iter()
                    .map(|g| ChoiceOption { key: g.key(), label: g.label() })
                    .collect()
            },
            select: |k| Gender::from_key(k).map(|g| FieldValue::Gender(Some(g))),
        },
    },
    FieldSpec {
        kind: FieldKind::Size,
        key: "size",
        label: "Размер",
        input: FieldInput::Choice {
            options: || {
                Size::ALL
                    .iter()
                    .map(|s| ChoiceOption { key: s.key(), label: s.key() })
                    .collect()
            },
            select: |k| Size::from_key(k).map(|s| FieldValue::Size(Some(s))),
        },
    },
    FieldSpec {
        kind: FieldKind::Church,
        key: "church",
        label: "Церковь",
        input: FieldInput::Text {
            required: false,
            hint: "Название церкви",
            parse: |s| plain_text(s).map(|v| FieldValue::Church(Some(v))),
        },
    },
    FieldSpec {
        kind: FieldKind::Role,
        key: "role",
        label: "Роль",
        input: FieldInput::Choice {
            options: || {
                Role::ALL
                    .iter()
                    .map(|r| ChoiceOption { key: r.key(), label: r.label() })
                    .collect()
            },
            select: |k| Role::from_key(k).map(FieldValue::Role),
        },
    },
    FieldSpec {
        kind: FieldKind::Department,
        key: "department",
        label: "Департамент",
        input: FieldInput::Choice {
            options: || {
                let mut options: Vec<ChoiceOption> = Department::ALL
                    .iter()
                    .map(|d| ChoiceOption { key: d.key(), label: d.label() })
                    .collect();
                options.push(ChoiceOption { key: NONE_KEY, label: "Без департамента" });
                options
            },
            select: |k| {
                if k == NONE_KEY {
                    return Some(FieldValue::Department(None));
                }
                Department::from_key(k).map(|d| FieldValue::Department(Some(d)))
            },
        },
    },
    FieldSpec {
        kind: FieldKind::CountryAndCity,
        key: "city",
        label: "Страна и город",
        input: FieldInput::Text {
            required: false,
            hint: "Например: Россия, Москва",
            parse: |s| plain_text(s).map(|v| FieldValue::CountryAndCity(Some(v))),
        },
    },
    FieldSpec {
        kind: FieldKind::SubmittedBy,
        key: "submitted_by",
        label: "Кто подал",
        input: FieldInput::Text {
            required: false,
            hint: "Имя того, кто подал заявку",
            parse: |s| plain_text(s).map(|v| FieldValue::SubmittedBy(Some(v))),
        },
    },
    FieldSpec {
        kind: FieldKind::ContactInformation,
        key: "contact",
        label: "Контакты",
        input: FieldInput::Text {
            required: false,
            hint: "Телефон, email или Telegram",
            parse: |s| plain_text(s).map(|v| FieldValue::ContactInformation(Some(v))),
        },
    },
    FieldSpec {
        kind: FieldKind::Floor,
        key: "floor",
        label: "Этаж",
        input: FieldInput::Text {
            required: false,
            hint: "Номер этажа, 0-50",
            parse: |s| floor_number(s).map(|v| FieldValue::Floor(Some(v))),
        },
    },
    FieldSpec {
        kind: FieldKind::RoomNumber,
        key: "room",
        label: "Комната",
        input: FieldInput::Text {
            required: false,
            hint: "Номер комнаты, например 203 или 2-A",
            parse: |s| room_number(s).map(|v| FieldValue::RoomNumber(Some(v))),
        },
    },
    FieldSpec {
        kind: FieldKind::PaymentStatus,
        key: "payment",
        label: "Статус оплаты",
        input: FieldInput::Choice {
            options: || {
                PaymentStatus::ALL
                    .iter()
                    .map(|p| ChoiceOption { key: p.key(), label: p.label() })
                    .collect()
            },
            select: |k| PaymentStatus::from_key(k).map(FieldValue::PaymentStatus),
        },
    },
    FieldSpec {
        kind: FieldKind::PaymentAmount,
        key: "amount",
        label: "Сумма оплаты",
        input: FieldInput::Text {
            required: false,
            hint: "Сумма цифрами, например 15 000",
            parse: |s| amount(s).map(|v| FieldValue::PaymentAmount(Some(v))),
        },
    },
    FieldSpec {
        kind: FieldKind::Notes,
        key: "notes",
        label: "Заметки",
        input: FieldInput::Text {
            required: false,
            hint: "Любой текст",
            parse: |s| plain_text(s).map(|v| FieldValue::Notes(Some(v))),
        },
    },
];

impl FieldKind {
    pub fn spec(self) -> &'static FieldSpec {
        // FIELDS is declared in enum order
        &FIELDS[self as usize]
    }

    pub fn key(self) -> &'static str {
        self.spec().key
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }

    pub fn from_key(key: &str) -> Option<Self> {
        FIELDS.iter().find(|f| f.key == key).map(|f| f.kind)
    }

    pub fn all() -> impl Iterator<Item = FieldKind> {
        FIELDS.iter().map(|f| f.kind)
    }

    pub fn is_choice(self) -> bool {
        matches!(self.spec().input, FieldInput::Choice { .. })
    }

    pub fn is_required(self) -> bool {
        match self.spec().input {
            FieldInput::Text { required, .. } => required,
            FieldInput::Choice { .. } => false,
        }
    }

    /// Options of a choice field; empty for text fields.
    pub fn options(self) -> Vec<ChoiceOption> {
        match self.spec().input {
            FieldInput::Choice { options, .. } => options(),
            FieldInput::Text { .. } => Vec::new(),
        }
    }

    /// Prompt shown when asking for a new value.
    pub fn prompt(self) -> String {
        match self.spec().input {
            FieldInput::Text { required: true, hint, .. } => {
                format!("Введите «{}»\n<i>{}</i>", self.label(), hint)
            }
            FieldInput::Text { hint, .. } => format!(
                "Введите «{}»\n<i>{}</i>\nОтправьте «{}», чтобы очистить поле.",
                self.label(),
                hint,
                CLEAR_MARKER
            ),
            FieldInput::Choice { .. } => format!("Выберите «{}»", self.label()),
        }
    }

    /// Convert user input into a value.
    ///
    /// Choice fields accept an option key, an option label, or a label close
    /// enough by Jaro-Winkler.
    pub fn parse(self, input: &str) -> Result<FieldValue, InvalidInput> {
        let input = input.trim();
        match self.spec().input {
            FieldInput::Text { required, parse, .. } => {
                if input == CLEAR_MARKER || input.is_empty() {
                    if required {
                        return Err(invalid(format!("Поле «{}» обязательно", self.label())));
                    }
                    return Ok(self.cleared());
                }
                parse(input)
            }
            FieldInput::Choice { options, select } => {
                if let Some(v) = select(input) {
                    return Ok(v);
                }
                let options = options();
                let by_label = options
                    .iter()
                    .find(|o| fuzzy::normalize(o.label) == fuzzy::normalize(input))
                    .or_else(|| {
                        let (label, _) = fuzzy::closest(
                            input,
                            options.iter().map(|o| o.label),
                            fuzzy::DEFAULT_THRESHOLD,
                        )?;
                        options.iter().find(|o| o.label == label)
                    });
                by_label.and_then(|o| select(o.key)).ok_or_else(|| {
                    let labels: Vec<&str> = options.iter().map(|o| o.label).collect();
                    invalid(format!("Выберите один из вариантов: {}", labels.join(", ")))
                })
            }
        }
    }

    /// Value that empties this field.
    fn cleared(self) -> FieldValue {
        match self {
            FieldKind::FullNameRu => FieldValue::FullNameRu(String::new()),
            FieldKind::FullNameEn => FieldValue::FullNameEn(None),
            FieldKind::Gender => FieldValue::Gender(None),
            FieldKind::Size => FieldValue::Size(None),
            FieldKind::Church => FieldValue::Church(None),
            FieldKind::Role => FieldValue::Role(Role::default()),
            FieldKind::Department => FieldValue::Department(None),
            FieldKind::CountryAndCity => FieldValue::CountryAndCity(None),
            FieldKind::SubmittedBy => FieldValue::SubmittedBy(None),
            FieldKind::ContactInformation => FieldValue::ContactInformation(None),
            FieldKind::Floor => FieldValue::Floor(None),
            FieldKind::RoomNumber => FieldValue::RoomNumber(None),
            FieldKind::PaymentStatus => FieldValue::PaymentStatus(PaymentStatus::default()),
            FieldKind::PaymentAmount => FieldValue::PaymentAmount(None),
            FieldKind::Notes => FieldValue::Notes(None),
        }
    }

    /// Current value of this field on `p`, for display.
    pub fn display(self, p: &Participant) -> Option<String> {
        let text = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
        match self {
            FieldKind::FullNameRu => Some(p.full_name_ru.clone()).filter(|s| !s.is_empty()),
            FieldKind::FullNameEn => text(&p.full_name_en),
            FieldKind::Gender => p.gender.map(|g| g.label().to_string()),
            FieldKind::Size => p.size.map(|s| s.key().to_string()),
            FieldKind::Church => text(&p.church),
            FieldKind::Role => Some(p.role.label().to_string()),
            FieldKind::Department => p.department.map(|d| d.label().to_string()),
            FieldKind::CountryAndCity => text(&p.country_and_city),
            FieldKind::SubmittedBy => text(&p.submitted_by),
            FieldKind::ContactInformation => text(&p.contact_information),
            FieldKind::Floor => p.floor.map(|f| f.to_string()),
            FieldKind::RoomNumber => text(&p.room_number),
            FieldKind::PaymentStatus => Some(p.payment_status.label().to_string()),
            FieldKind::PaymentAmount => p.payment_amount.map(|a| a.to_string()),
            FieldKind::Notes => text(&p.notes),
        }
    }
}

fn regex(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

fn person_name(s: &str) -> Result<String, InvalidInput> {
    let letters = s.chars().filter(|c| c.is_alphabetic()).count();
    if letters < 2 {
        return Err(invalid("Имя должно содержать хотя бы две буквы"));
    }
    Ok(s.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn plain_text(s: &str) -> Result<String, InvalidInput> {
    Ok(s.to_string())
}

fn room_number(s: &str) -> Result<String, InvalidInput> {
    static ROOM: OnceLock<Option<Regex>> = OnceLock::new();
    match regex(&ROOM, r"^[0-9A-Za-zА-Яа-яЁё\-/]{1,10}$") {
        Some(re) if re.is_match(s) => Ok(s.to_string()),
        _ => Err(invalid(
            "Номер комнаты: до 10 символов, буквы, цифры, «-» или «/»",
        )),
    }
}

fn floor_number(s: &str) -> Result<u32, InvalidInput> {
    match s.parse::<u32>() {
        Ok(n) if n <= MAX_FLOOR => Ok(n),
        _ => Err(invalid(format!("Этаж должен быть числом от 0 до {}", MAX_FLOOR))),
    }
}

fn amount(s: &str) -> Result<u32, InvalidInput> {
    static AMOUNT: OnceLock<Option<Regex>> = OnceLock::new();
    let valid = regex(&AMOUNT, r"^[0-9][0-9 ]*$").map(|re| re.is_match(s)).unwrap_or(false);
    let digits: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    match digits.parse::<u32>() {
        Ok(n) if valid => Ok(n),
        _ => Err(invalid("Сумма должна состоять только из цифр")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_in_enum_order() {
        for (i, spec) in FIELDS.iter().enumerate() {
            assert_eq!(spec.kind as usize, i, "{} out of order", spec.key);
            assert_eq!(FieldKind::from_key(spec.key), Some(spec.kind));
        }
        assert_eq!(FieldKind::all().count(), 15);
    }

    #[test]
    fn test_room_validation() {
        assert_eq!(
            FieldKind::RoomNumber.parse("2-A").unwrap(),
            FieldValue::RoomNumber(Some("2-A".to_string()))
        );
        assert_eq!(
            FieldKind::RoomNumber.parse("12/б").unwrap(),
            FieldValue::RoomNumber(Some("12/б".to_string()))
        );
        assert!(FieldKind::RoomNumber.parse("room 12").is_err());
        assert!(FieldKind::RoomNumber.parse("12345678901").is_err());
    }

    #[test]
    fn test_clear_optional_field() {
        assert_eq!(FieldKind::RoomNumber.parse("-").unwrap(), FieldValue::RoomNumber(None));
        assert_eq!(FieldKind::Floor.parse(" - ").unwrap(), FieldValue::Floor(None));
    }

    #[test]
    fn test_required_name_cannot_be_cleared() {
        assert!(FieldKind::FullNameRu.parse("-").is_err());
        assert!(FieldKind::FullNameRu.parse("И").is_err());
        assert_eq!(
            FieldKind::FullNameRu.parse("  Иван   Петров ").unwrap(),
            FieldValue::FullNameRu("Иван Петров".to_string())
        );
    }

    #[test]
    fn test_floor_range() {
        assert_eq!(FieldKind::Floor.parse("0").unwrap(), FieldValue::Floor(Some(0)));
        assert_eq!(FieldKind::Floor.parse("50").unwrap(), FieldValue::Floor(Some(50)));
        assert!(FieldKind::Floor.parse("51").is_err());
        assert!(FieldKind::Floor.parse("второй").is_err());
    }

    #[test]
    fn test_amount_allows_spaces() {
        assert_eq!(
            FieldKind::PaymentAmount.parse("15 000").unwrap(),
            FieldValue::PaymentAmount(Some(15000))
        );
        assert!(FieldKind::PaymentAmount.parse("15.5").is_err());
        assert!(FieldKind::PaymentAmount.parse("abc").is_err());
    }

    #[test]
    fn test_choice_by_key_label_and_typo() {
        assert_eq!(
            FieldKind::Role.parse("TEAM").unwrap(),
            FieldValue::Role(Role::Team)
        );
        assert_eq!(
            FieldKind::Role.parse("команда").unwrap(),
            FieldValue::Role(Role::Team)
        );
        assert_eq!(
            FieldKind::Department.parse("Прославлени").unwrap(),
            FieldValue::Department(Some(Department::Worship))
        );
        assert_eq!(
            FieldKind::Department.parse(NONE_KEY).unwrap(),
            FieldValue::Department(None)
        );
        assert!(FieldKind::Gender.parse("нечто").is_err());
    }

    #[test]
    fn test_apply_role_candidate_drops_department() {
        let mut p = Participant::new("Анна");
        FieldValue::Role(Role::Team).apply(&mut p);
        FieldValue::Department(Some(Department::Kitchen)).apply(&mut p);
        assert_eq!(p.department, Some(Department::Kitchen));
        FieldValue::Role(Role::Candidate).apply(&mut p);
        assert_eq!(p.department, None);
    }

    #[test]
    fn test_value_kind_matches() {
        let v = FieldKind::Notes.parse("поздний заезд").unwrap();
        assert_eq!(v.kind(), FieldKind::Notes);
        let mut p = Participant::new("Анна");
        v.apply(&mut p);
        assert_eq!(FieldKind::Notes.display(&p).as_deref(), Some("поздний заезд"));
    }

    #[test]
    fn test_choice_options() {
        assert_eq!(FieldKind::Size.options().len(), 7);
        assert_eq!(FieldKind::Department.options().len(), 14);
        assert!(FieldKind::Notes.options().is_empty());
        assert!(FieldKind::Gender.is_choice());
        assert!(FieldKind::FullNameRu.is_required());
    }
}
