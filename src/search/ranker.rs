//! Rank candidates against a name query.

use rayon::prelude::*;
use std::cmp::Ordering;

use super::fuzzy;

/// Default minimum score for a candidate to be returned.
pub const DEFAULT_SEARCH_THRESHOLD: f64 = 0.8;

/// Default number of results returned.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Anything with one or more optional name fields.
pub trait Searchable {
    /// Name fields to score; `None` and empty strings are skipped.
    fn name_fields(&self) -> Vec<Option<&str>>;
}

/// Threshold and result cap for a ranking call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    pub threshold: f64,
    pub limit: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SEARCH_THRESHOLD,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl SearchOptions {
    pub fn new(threshold: f64, limit: usize) -> Self {
        Self { threshold, limit }
    }
}

/// A candidate paired with its best name score.
#[derive(Debug)]
pub struct SearchResult<'a, T> {
    pub item: &'a T,
    pub score: f64,
}

impl<T> Clone for SearchResult<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SearchResult<'_, T> {}

impl<T> PartialEq for SearchResult<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.score.total_cmp(&other.score) == Ordering::Equal
    }
}

impl<T> Eq for SearchResult<'_, T> {}

impl<T> PartialOrd for SearchResult<'_, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Inverted on score: an ascending sort yields highest score first.
impl<T> Ord for SearchResult<'_, T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other.score.total_cmp(&self.score)
    }
}

/// Best score across all populated name fields of `item`.
pub fn best_score<T: Searchable>(normalized_query: &str, item: &T) -> f64 {
    item.name_fields()
        .into_iter()
        .flatten()
        .filter(|name| !name.trim().is_empty())
        .map(|name| fuzzy::score(normalized_query, name))
        .fold(0.0, f64::max)
}

/// Rank `candidates` by similarity to `query`.
///
/// Blank query, no candidates or a zero limit give an empty result. Kept
/// results have `score >= threshold`, are ordered by score descending and
/// keep input order among equal scores.
pub fn rank<'a, T>(query: &str, candidates: &'a [T], options: SearchOptions) -> Vec<SearchResult<'a, T>>
where
    T: Searchable + Sync,
{
    if query.trim().is_empty() || candidates.is_empty() || options.limit == 0 {
        return Vec::new();
    }

    let threshold = if options.threshold.is_nan() {
        DEFAULT_SEARCH_THRESHOLD
    } else {
        options.threshold.clamp(0.0, 1.0)
    };
    let normalized = fuzzy::normalize(query);

    // Collect preserves input order, which the stable sort below relies on
    let mut results: Vec<SearchResult<'a, T>> = candidates
        .par_iter()
        .map(|item| SearchResult {
            item,
            score: best_score(&normalized, item),
        })
        .filter(|r| r.score >= threshold)
        .collect();

    results.sort();
    results.truncate(options.limit);

    tracing::debug!(
        query = %query,
        candidates = candidates.len(),
        matched = results.len(),
        "ranked name search"
    );

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Person {
        id: usize,
        name_ru: Option<String>,
        name_en: Option<String>,
    }

    impl Searchable for Person {
        fn name_fields(&self) -> Vec<Option<&str>> {
            vec![self.name_ru.as_deref(), self.name_en.as_deref()]
        }
    }

    fn ru(id: usize, name: &str) -> Person {
        Person {
            id,
            name_ru: Some(name.to_string()),
            name_en: None,
        }
    }

    #[test]
    fn test_empty_query_yields_nothing() {
        let people = vec![ru(0, "Иван Иванов")];
        assert!(rank("", &people, SearchOptions::default()).is_empty());
        assert!(rank("   ", &people, SearchOptions::default()).is_empty());
    }

    #[test]
    fn test_empty_candidates_yield_nothing() {
        let people: Vec<Person> = Vec::new();
        assert!(rank("query", &people, SearchOptions::default()).is_empty());
    }

    #[test]
    fn test_zero_limit_yields_nothing() {
        let people = vec![ru(0, "Иван Иванов")];
        assert!(rank("Иван Иванов", &people, SearchOptions::new(0.5, 0)).is_empty());
    }

    #[test]
    fn test_yo_normalization_matches() {
        let people = vec![ru(0, "Алёксей Петров")];
        let results = rank("Алексей Петров", &people, SearchOptions::new(0.8, 5));
        assert_eq!(results.len(), 1);
        assert!(results[0].score >= 0.95);
    }

    #[test]
    fn test_partial_query_scenario() {
        let people = vec![ru(0, "Иван Иванов"), ru(1, "Мария Петрова")];
        let results = rank("Иван", &people, SearchOptions::new(0.5, 5));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].item.id, 0);
        assert!(results[0].score >= 0.5 && results[0].score < 1.0);
    }

    #[test]
    fn test_no_match_scenario() {
        let people = vec![ru(0, "Мария Петрова")];
        assert!(rank("Zzzxyz123", &people, SearchOptions::new(0.8, 5)).is_empty());
    }

    #[test]
    fn test_limit_caps_equal_scores() {
        let people: Vec<Person> = (0..10).map(|i| ru(i, "Анна Смирнова")).collect();
        let results = rank("Анна Смирнова", &people, SearchOptions::new(0.8, 5));
        assert_eq!(results.len(), 5);
        assert!(results.iter().all(|r| r.score == 1.0));
        // Ties keep input order
        let ids: Vec<usize> = results.iter().map(|r| r.item.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_secondary_name_field_counts() {
        let people = vec![Person {
            id: 7,
            name_ru: Some("Пётр Сидоров".to_string()),
            name_en: Some("Petr Sidorov".to_string()),
        }];
        let results = rank("Sidorov Petr", &people, SearchOptions::default());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 1.0);
    }

    #[test]
    fn test_no_name_fields_excluded() {
        let people = vec![Person::default(), ru(1, "Ольга")];
        let results = rank("Ольга", &people, SearchOptions::new(0.8, 5));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].item.id, 1);
    }

    #[test]
    fn test_descending_order() {
        let people = vec![
            ru(0, "Мария Петрова"),
            ru(1, "Мария Петровна"),
            ru(2, "Мария Петрова"),
            ru(3, "Марина Петренко"),
        ];
        let results = rank("Мария Петрова", &people, SearchOptions::new(0.0, 10));
        assert_eq!(results.len(), 4);
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert_eq!(results[0].item.id, 0);
        assert_eq!(results[1].item.id, 2);
    }

    #[test]
    fn test_threshold_monotonic() {
        let people = vec![
            ru(0, "Иван Иванов"),
            ru(1, "Иван Петров"),
            ru(2, "Ивана Иванова"),
            ru(3, "Мария Петрова"),
        ];
        let mut previous = usize::MAX;
        for step in 0..=10 {
            let threshold = step as f64 / 10.0;
            let n = rank("Иван Иванов", &people, SearchOptions::new(threshold, 10)).len();
            assert!(n <= previous);
            previous = n;
        }
    }

    #[test]
    fn test_threshold_clamped() {
        let people = vec![ru(0, "Иван Иванов")];
        assert_eq!(rank("Иван Иванов", &people, SearchOptions::new(1.5, 5)).len(), 1);
        assert_eq!(rank("Мария", &people, SearchOptions::new(-1.0, 5)).len(), 1);
    }

    #[test]
    fn test_ordering_inverts_score() {
        let a = ru(0, "a");
        let b = ru(1, "b");
        let low = SearchResult { item: &a, score: 0.5 };
        let high = SearchResult { item: &b, score: 0.9 };
        assert!(high < low);
    }
}
