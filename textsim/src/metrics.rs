//! Similarity metrics over normalized text.

use serde::{Deserialize, Serialize};

use crate::normalize::{normalize, word_set};

/// Compute the Levenshtein edit distance between two strings.
///
/// Operates on characters, not bytes, so multi-byte text compares
/// correctly. Uses the two-row dynamic programming formulation.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Levenshtein similarity ratio between the *normalized* forms of two
/// strings.
///
/// Returns a value between 0.0 and 1.0, where 1.0 means the normalized
/// strings are identical. Two empty strings are identical by definition.
pub fn levenshtein_ratio(a: &str, b: &str) -> f32 {
    let a = normalize(a);
    let b = normalize(b);

    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }

    1.0 - (levenshtein(&a, &b) as f32 / max_len as f32)
}

/// Jaccard index (intersection over union) of the normalized word sets of
/// two strings.
///
/// Returns a value between 0.0 and 1.0. Two strings with empty word sets
/// are considered identical (1.0).
pub fn jaccard(a: &str, b: &str) -> f32 {
    let wa = word_set(a);
    let wb = word_set(b);

    if wa.is_empty() && wb.is_empty() {
        return 1.0;
    }

    let intersection = wa.intersection(&wb).count();
    let union = wa.union(&wb).count();

    intersection as f32 / union as f32
}

/// Word-overlap statistics between two strings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WordOverlap {
    /// Number of distinct normalized words shared by both strings.
    pub shared: usize,

    /// Size of the smaller of the two word sets.
    pub smaller: usize,

    /// Shared words as a fraction of the smaller set (0.0 when a set is
    /// empty).
    pub ratio: f32,
}

/// Compute word-overlap statistics for two strings.
///
/// The ratio is measured against the *smaller* word set, so a short
/// description fully contained in a longer one scores 1.0.
pub fn word_overlap(a: &str, b: &str) -> WordOverlap {
    let wa = word_set(a);
    let wb = word_set(b);

    let shared = wa.intersection(&wb).count();
    let smaller = wa.len().min(wb.len());
    let ratio = if smaller == 0 {
        0.0
    } else {
        shared as f32 / smaller as f32
    };

    WordOverlap {
        shared,
        smaller,
        ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("kitten", "kitten"), 0);
    }

    #[test]
    fn test_levenshtein_classic() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("", ""), 0);
    }

    #[test]
    fn test_levenshtein_ratio_identical_after_normalization() {
        let ratio = levenshtein_ratio("Update salary!", "update   salary");
        assert!((ratio - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_levenshtein_ratio_both_empty() {
        assert!((levenshtein_ratio("", "") - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_levenshtein_ratio_similar_names() {
        // One trailing character differs.
        let ratio = levenshtein_ratio("thomas miller", "thomas millers");
        assert!(ratio > 0.9);

        // Different surnames fall well below the name thresholds.
        let ratio = levenshtein_ratio("Thomas Miller", "Thomas Williams");
        assert!(ratio < 0.8);
    }

    #[test]
    fn test_jaccard_identical_sets() {
        let sim = jaccard("raise the salary", "the salary raise");
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_jaccard_disjoint() {
        let sim = jaccard("alpha beta", "gamma delta");
        assert!((sim - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_jaccard_partial() {
        // {a, b, c} vs {b, c, d}: 2 shared, 4 in union.
        let sim = jaccard("a b c", "b c d");
        assert!((sim - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_word_overlap_contained() {
        let stats = word_overlap("update salary", "please update the salary for thomas");
        assert_eq!(stats.shared, 2);
        assert_eq!(stats.smaller, 2);
        assert!((stats.ratio - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_word_overlap_empty_side() {
        let stats = word_overlap("", "some words here");
        assert_eq!(stats.shared, 0);
        assert_eq!(stats.smaller, 0);
        assert!((stats.ratio - 0.0).abs() < 1e-6);
    }
}
