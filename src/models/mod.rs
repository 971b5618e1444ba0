//! Domain records.

pub mod participant;
pub mod schedule;

pub use participant::{Department, Gender, Participant, PaymentStatus, Role, Size};
pub use schedule::ScheduleEvent;
