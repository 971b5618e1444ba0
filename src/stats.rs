//! Aggregated participant statistics.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{Department, Gender, Participant, PaymentStatus, Role};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statistics {
    pub total: usize,
    pub candidates: usize,
    pub team: usize,
    pub men: usize,
    pub women: usize,
    /// Team members per department, in department order. Departments with
    /// nobody assigned are omitted.
    pub team_by_department: Vec<(String, usize)>,
    pub team_without_department: usize,
    pub paid: usize,
    pub partially_paid: usize,
    pub unpaid: usize,
    pub total_payments: u64,
    pub with_room: usize,
    pub without_room: usize,
    /// Participants per floor, ascending by floor.
    pub by_floor: Vec<(u32, usize)>,
}

impl Statistics {
    pub fn collect(participants: &[Participant]) -> Self {
        let mut stats = Statistics {
            total: participants.len(),
            ..Default::default()
        };
        let mut departments: BTreeMap<Department, usize> = BTreeMap::new();
        let mut floors: BTreeMap<u32, usize> = BTreeMap::new();

        for p in participants {
            match p.role {
                Role::Candidate => stats.candidates += 1,
                Role::Team => {
                    stats.team += 1;
                    match p.department {
                        Some(d) => *departments.entry(d).or_insert(0) += 1,
                        None => stats.team_without_department += 1,
                    }
                }
            }
            match p.gender {
                Some(Gender::M) => stats.men += 1,
                Some(Gender::F) => stats.women += 1,
                None => {}
            }
            match p.payment_status {
                PaymentStatus::Paid => stats.paid += 1,
                PaymentStatus::Partial => stats.partially_paid += 1,
                PaymentStatus::Unpaid => stats.unpaid += 1,
            }
            stats.total_payments += u64::from(p.payment_amount.unwrap_or(0));
            if p.has_room() {
                stats.with_room += 1;
            } else {
                stats.without_room += 1;
            }
            if let Some(floor) = p.floor {
                *floors.entry(floor).or_insert(0) += 1;
            }
        }

        stats.team_by_department = departments
            .into_iter()
            .map(|(d, n)| (d.label().to_string(), n))
            .collect();
        stats.by_floor = floors.into_iter().collect();
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(role: Role, gender: Gender) -> Participant {
        let mut p = Participant::new("x");
        p.role = role;
        p.gender = Some(gender);
        p
    }

    #[test]
    fn test_empty() {
        let s = Statistics::collect(&[]);
        assert_eq!(s, Statistics::default());
    }

    #[test]
    fn test_counts() {
        let mut a = person(Role::Candidate, Gender::M);
        a.payment_status = PaymentStatus::Paid;
        a.payment_amount = Some(15000);
        a.floor = Some(2);
        a.room_number = Some("201".to_string());

        let mut b = person(Role::Team, Gender::F);
        b.department = Some(Department::Kitchen);
        b.payment_status = PaymentStatus::Partial;
        b.payment_amount = Some(5000);
        b.floor = Some(1);
        b.room_number = Some("  ".to_string());

        let mut c = person(Role::Team, Gender::M);
        c.department = Some(Department::Roe);

        let d = person(Role::Team, Gender::F);

        let s = Statistics::collect(&[a, b, c, d]);
        assert_eq!(s.total, 4);
        assert_eq!(s.candidates, 1);
        assert_eq!(s.team, 3);
        assert_eq!(s.men, 2);
        assert_eq!(s.women, 2);
        assert_eq!(
            s.team_by_department,
            vec![("РОЕ".to_string(), 1), ("Кухня".to_string(), 1)]
        );
        assert_eq!(s.team_without_department, 1);
        assert_eq!((s.paid, s.partially_paid, s.unpaid), (1, 1, 2));
        assert_eq!(s.total_payments, 20000);
        assert_eq!((s.with_room, s.without_room), (1, 3));
        assert_eq!(s.by_floor, vec![(1, 1), (2, 1)]);
    }
}
