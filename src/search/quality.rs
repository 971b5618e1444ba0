//! Coarse match-quality buckets for display.
//!
//! Lower bounds are inclusive: a score exactly on a boundary belongs to the
//! higher bucket.

/// Lower bound of the `Exact` bucket.
pub const EXACT_MIN: f64 = 0.95;
/// Lower bound of the `High` bucket.
pub const HIGH_MIN: f64 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchQuality {
    Medium,
    High,
    Exact,
}

impl MatchQuality {
    pub fn from_score(score: f64) -> Self {
        if score >= EXACT_MIN {
            MatchQuality::Exact
        } else if score >= HIGH_MIN {
            MatchQuality::High
        } else {
            MatchQuality::Medium
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MatchQuality::Exact => "точное совпадение",
            MatchQuality::High => "высокое сходство",
            MatchQuality::Medium => "среднее сходство",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            MatchQuality::Exact => "🎯",
            MatchQuality::High => "✅",
            MatchQuality::Medium => "🔍",
        }
    }
}

/// Display label for a score.
pub fn label(score: f64) -> &'static str {
    MatchQuality::from_score(score).label()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_go_up() {
        assert_eq!(MatchQuality::from_score(0.95), MatchQuality::Exact);
        assert_eq!(MatchQuality::from_score(0.85), MatchQuality::High);
        assert_eq!(MatchQuality::from_score(0.8499), MatchQuality::Medium);
        assert_eq!(MatchQuality::from_score(1.0), MatchQuality::Exact);
        assert_eq!(MatchQuality::from_score(0.0), MatchQuality::Medium);
    }

    #[test]
    fn test_monotonic() {
        let mut previous = MatchQuality::from_score(0.0);
        for step in 0..=1000 {
            let q = MatchQuality::from_score(step as f64 / 1000.0);
            assert!(q >= previous);
            previous = q;
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(label(0.99), "точное совпадение");
        assert_eq!(label(0.9), "высокое сходство");
        assert_eq!(label(0.5), "среднее сходство");
    }
}
