//! Fuzzy name matching primitives.
//!
//! `token_sort_ratio` is the fuzzywuzzy/RapidFuzz metric: tokens are sorted
//! before an Indel (insert/delete only) similarity is taken, so word order in
//! the stored name does not matter.
//!
//! CHANGELOG:
//! - 10/19/2026 - Indel ratio from rapidfuzz
//! - 10/19/2026 - Indel ratio instead of Jaro-Winkler for token sort
//! - 10/19/2026 - Russian normalization (ё/й)

use rapidfuzz::fuzz;
use strsim::jaro_winkler;

/// Default threshold for loose label matching (0.0 - 1.0).
pub const DEFAULT_THRESHOLD: f64 = 0.85;

/// Canonicalize text before comparison.
///
/// Lower-cases, then folds `ё` to `е` and `й` to `и`. Nothing else is touched:
/// punctuation and whitespace survive as-is.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| match c {
            'ё' => 'е',
            'й' => 'и',
            other => other,
        })
        .collect()
}

/// Sort whitespace-separated tokens and rejoin with single spaces.
fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Token sort ratio (0.0 - 1.0). Either side empty scores 0.0.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let a_sorted = sorted_tokens(a);
    let b_sorted = sorted_tokens(b);
    if a_sorted.is_empty() || b_sorted.is_empty() {
        return 0.0;
    }
    // Indel similarity: 2 * LCS / (len_a + len_b), over chars
    fuzz::ratio(a_sorted.chars(), b_sorted.chars())
}

/// Score a raw field value against an already-normalized query.
pub fn score(normalized_query: &str, field: &str) -> f64 {
    token_sort_ratio(normalized_query, &normalize(field))
}

/// Pick the option closest to `input` by Jaro-Winkler, if any reaches `threshold`.
///
/// Used for short labels (choice values, command names), where a prefix-biased
/// metric suits typos better than token sorting.
pub fn closest<'a, I>(input: &str, options: I, threshold: f64) -> Option<(&'a str, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    let needle = normalize(input.trim());
    if needle.is_empty() {
        return None;
    }
    options
        .into_iter()
        .map(|opt| (opt, jaro_winkler(&needle, &normalize(opt))))
        .filter(|(_, s)| *s >= threshold)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
}
