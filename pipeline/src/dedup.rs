//! The duplicate cascade: ordered similarity rules that collapse
//! near-duplicate work items.
//!
//! A candidate is a duplicate iff *any* rule matches it against *any*
//! already-accepted item. The rules are evaluated in a fixed, significant
//! order and the first match wins; they are deliberately kept as
//! independent named functions rather than one combined expression so the
//! ordering stays explicit and each rule testable on its own.
//!
//! Known, accepted gap: rules 1-5 never inspect the effective date, so two
//! items identical in description and subject but differing only in date
//! are treated as duplicates. Rule 6 uses the date only as an additional
//! restriction. The opt-in `distinguish_effective_date` flag vetoes all
//! rules when two non-empty dates differ; it is off by default pending a
//! product decision.

use serde::{Deserialize, Serialize};
use tracing::debug;

use fanout_textsim::{jaccard, levenshtein_ratio, normalize, word_overlap};

use crate::item::WorkItem;

/// Thresholds for the duplicate cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Strong name-similarity threshold (Levenshtein ratio).
    pub strong_name_threshold: f32,

    /// Medium name-similarity threshold. Looser than strong; only ever
    /// paired with the strictest description rule.
    pub medium_name_threshold: f32,

    /// Absolute floor on shared-word count for the lexical-overlap rule.
    pub overlap_shared_floor: usize,

    /// Minimum size of the smaller word set for the lexical-overlap rule's
    /// absolute branch.
    pub overlap_min_smaller: usize,

    /// Overlap ratio (against the smaller set) above which the lexical
    /// overlap counts on its own.
    pub overlap_ratio_threshold: f32,

    /// Strong Jaccard (set-similarity) threshold.
    pub jaccard_strong_threshold: f32,

    /// Levenshtein similarity threshold on the full primary description.
    pub levenshtein_threshold: f32,

    /// Medium Jaccard threshold, used together with a matching effective
    /// date.
    pub jaccard_medium_threshold: f32,

    /// Opt-in: when true, two items whose non-empty normalized effective
    /// dates differ are never duplicates, regardless of the rules below.
    /// Off by default to preserve the date-blind behavior of rules 1-5.
    pub distinguish_effective_date: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            strong_name_threshold: 0.9,
            medium_name_threshold: 0.8,
            overlap_shared_floor: 12,
            overlap_min_smaller: 10,
            overlap_ratio_threshold: 0.8,
            jaccard_strong_threshold: 0.85,
            levenshtein_threshold: 0.9,
            jaccard_medium_threshold: 0.75,
            distinguish_effective_date: false,
        }
    }
}

/// One rule in the cascade: a named, side-effect-free predicate over a
/// candidate/accepted item pair.
struct DuplicateRule {
    name: &'static str,
    check: fn(&WorkItem, &WorkItem, &DedupConfig) -> bool,
}

/// Rules in evaluation order. The order is significant: first match wins,
/// and later rules never override an earlier accept.
const RULES: &[DuplicateRule] = &[
    DuplicateRule {
        name: "primary_description_and_name",
        check: primary_description_and_name,
    },
    DuplicateRule {
        name: "raw_description_and_name",
        check: raw_description_and_name,
    },
    DuplicateRule {
        name: "word_overlap_and_strong_name",
        check: word_overlap_and_strong_name,
    },
    DuplicateRule {
        name: "jaccard_and_strong_name",
        check: jaccard_and_strong_name,
    },
    DuplicateRule {
        name: "levenshtein_and_medium_name",
        check: levenshtein_and_medium_name,
    },
    DuplicateRule {
        name: "same_date_jaccard_and_strong_name",
        check: same_date_jaccard_and_strong_name,
    },
];

/// Rule 1: normalized primary descriptions equal and normalized subject
/// names equal.
fn primary_description_and_name(candidate: &WorkItem, accepted: &WorkItem, _: &DedupConfig) -> bool {
    normalize(candidate.primary_description()) == normalize(accepted.primary_description())
        && normalize(&candidate.subject_name) == normalize(&accepted.subject_name)
}

/// Rule 2: normalized raw descriptions equal and normalized subject names
/// equal. Catches pairs where translation differs but the untouched source
/// text is identical.
fn raw_description_and_name(candidate: &WorkItem, accepted: &WorkItem, _: &DedupConfig) -> bool {
    normalize(&candidate.description) == normalize(&accepted.description)
        && normalize(&candidate.subject_name) == normalize(&accepted.subject_name)
}

/// Rule 3: high lexical overlap on the primary description and a strong
/// name match. Two-sided: either the shared-word count reaches the
/// absolute floor with a long-enough smaller set, or the overlap ratio
/// against the smaller set is high.
fn word_overlap_and_strong_name(
    candidate: &WorkItem,
    accepted: &WorkItem,
    config: &DedupConfig,
) -> bool {
    let stats = word_overlap(candidate.primary_description(), accepted.primary_description());
    let overlap_hit = (stats.shared >= config.overlap_shared_floor
        && stats.smaller >= config.overlap_min_smaller)
        || stats.ratio >= config.overlap_ratio_threshold;

    overlap_hit && strong_name_match(candidate, accepted, config)
}

/// Rule 4: set similarity of the primary descriptions above the strong
/// threshold and a strong name match.
fn jaccard_and_strong_name(candidate: &WorkItem, accepted: &WorkItem, config: &DedupConfig) -> bool {
    jaccard(candidate.primary_description(), accepted.primary_description())
        >= config.jaccard_strong_threshold
        && strong_name_match(candidate, accepted, config)
}

/// Rule 5: edit-distance similarity of the full primary description above
/// a very high threshold and a medium (looser) name match. The loose name
/// threshold is safe only because the description threshold is the
/// strictest in the cascade.
fn levenshtein_and_medium_name(
    candidate: &WorkItem,
    accepted: &WorkItem,
    config: &DedupConfig,
) -> bool {
    levenshtein_ratio(candidate.primary_description(), accepted.primary_description())
        >= config.levenshtein_threshold
        && name_similarity(candidate, accepted) >= config.medium_name_threshold
}

/// Rule 6: same normalized effective date, medium set similarity, and a
/// strong name match. The date here is an additional restriction, never a
/// distinguishing signal.
fn same_date_jaccard_and_strong_name(
    candidate: &WorkItem,
    accepted: &WorkItem,
    config: &DedupConfig,
) -> bool {
    normalize(&candidate.effective_date) == normalize(&accepted.effective_date)
        && jaccard(candidate.primary_description(), accepted.primary_description())
            >= config.jaccard_medium_threshold
        && strong_name_match(candidate, accepted, config)
}

fn name_similarity(a: &WorkItem, b: &WorkItem) -> f32 {
    levenshtein_ratio(&a.subject_name, &b.subject_name)
}

fn strong_name_match(a: &WorkItem, b: &WorkItem, config: &DedupConfig) -> bool {
    name_similarity(a, b) >= config.strong_name_threshold
}

/// The ordered duplicate cascade.
pub struct DuplicateCascade {
    config: DedupConfig,
}

impl DuplicateCascade {
    /// Create a cascade with default thresholds.
    pub fn new() -> Self {
        Self {
            config: DedupConfig::default(),
        }
    }

    /// Create a cascade with custom thresholds.
    pub fn with_config(config: DedupConfig) -> Self {
        Self { config }
    }

    /// Whether the candidate duplicates any accepted item.
    pub fn is_duplicate(&self, candidate: &WorkItem, accepted: &[WorkItem]) -> bool {
        self.matched_rule(candidate, accepted).is_some()
    }

    /// The name of the first rule that matches the candidate against any
    /// accepted item, or `None` if the candidate is novel.
    ///
    /// Evaluation is directional by acceptance order: the candidate is
    /// compared against items in the order they were accepted, and within
    /// each pair the rules run in their fixed order.
    pub fn matched_rule(&self, candidate: &WorkItem, accepted: &[WorkItem]) -> Option<&'static str> {
        for existing in accepted {
            if self.config.distinguish_effective_date && dates_differ(candidate, existing) {
                continue;
            }
            for rule in RULES {
                if (rule.check)(candidate, existing, &self.config) {
                    debug!(
                        rule = rule.name,
                        candidate = %candidate.id,
                        matched = %existing.id,
                        "candidate dropped as duplicate"
                    );
                    return Some(rule.name);
                }
            }
        }
        None
    }
}

impl Default for DuplicateCascade {
    fn default() -> Self {
        Self::new()
    }
}

/// Both effective dates are non-empty and normalize differently.
fn dates_differ(a: &WorkItem, b: &WorkItem) -> bool {
    let da = normalize(&a.effective_date);
    let db = normalize(&b.effective_date);
    !da.is_empty() && !db.is_empty() && da != db
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use crate::item::ItemDraft;

    fn item(id: &str, description: &str, name: &str, date: &str) -> WorkItem {
        WorkItem::from_draft(
            id,
            "run-1",
            ItemDraft {
                description: description.to_string(),
                translated_description: String::new(),
                subject_name: name.to_string(),
                effective_date: date.to_string(),
            },
        )
    }

    #[test]
    fn test_identical_items_are_duplicates() {
        let cascade = DuplicateCascade::new();
        let first = item(
            "T-001",
            "Update health insurance provider to AOK Bayern for Thomas",
            "Thomas",
            "October 2025",
        );
        let second = item(
            "T-002",
            "Update health insurance provider to AOK Bayern for Thomas",
            "Thomas",
            "October 2025",
        );

        assert_eq!(
            cascade.matched_rule(&second, &[first]),
            Some("primary_description_and_name")
        );
    }

    #[test]
    fn test_translated_field_differs_but_raw_identical() {
        let cascade = DuplicateCascade::new();
        let mut first = item("T-001", "Gehalt von Anna auf 75000 erhöhen", "Anna", "");
        first.translated_description = "Raise Anna's salary to 75000".to_string();
        let mut second = item("T-002", "Gehalt von Anna auf 75000 erhöhen", "Anna", "");
        second.translated_description = "Increase the salary of Anna to 75000".to_string();

        assert_eq!(
            cascade.matched_rule(&second, &[first]),
            Some("raw_description_and_name")
        );
    }

    #[test]
    fn test_different_names_keep_both_items() {
        let cascade = DuplicateCascade::new();
        let first = item(
            "T-001",
            "Update health insurance provider to AOK Bayern",
            "Thomas Miller",
            "October 2025",
        );
        let second = item(
            "T-002",
            "Update health insurance provider to AOK Bayern",
            "Thomas Williams",
            "October 2025",
        );

        assert_eq!(cascade.matched_rule(&second, &[first]), None);
    }

    #[test]
    fn test_high_word_overlap_with_strong_name() {
        let cascade = DuplicateCascade::new();
        let first = item(
            "T-001",
            "Please update the home address for the employee record",
            "Sarah Connor",
            "",
        );
        // Shorter rewording whose words are almost all contained in the
        // first description: overlap ratio against the smaller set is high.
        let second = item(
            "T-002",
            "Update the home address for the employee",
            "Sarah Connor",
            "",
        );

        assert_eq!(
            cascade.matched_rule(&second, &[first]),
            Some("word_overlap_and_strong_name")
        );
    }

    #[test]
    fn test_jaccard_rule_fires_on_reordered_wording() {
        let cascade = DuplicateCascade::new();
        let first = item(
            "T-001",
            "increase monthly salary to 6000 euro gross",
            "Maria Schmidt",
            "",
        );
        let second = item(
            "T-002",
            "monthly salary increase to 6000 euro gross",
            "Maria Schmidt",
            "",
        );

        // Identical word sets, reordered: Jaccard 1.0. Rule 3's ratio
        // branch also matches, and being earlier in the order it wins.
        let rule = cascade.matched_rule(&second, &[first]);
        assert_eq!(rule, Some("word_overlap_and_strong_name"));
    }

    #[test]
    fn test_jaccard_rule_in_isolation() {
        // With the default thresholds rule 3 shadows rule 4 in the
        // cascade; the rule still holds on its own.
        let config = DedupConfig::default();
        let first = item("T-001", "increase monthly salary to 6000 euro", "Maria", "");
        let second = item("T-002", "monthly salary increase to 6000 euro", "Maria", "");
        assert!(jaccard_and_strong_name(&second, &first, &config));

        let third = item("T-003", "revoke parking permit", "Maria", "");
        assert!(!jaccard_and_strong_name(&third, &first, &config));
    }

    #[test]
    fn test_levenshtein_rule_tolerates_medium_name() {
        let config = DedupConfig::default();
        let first = item(
            "T-001",
            "Change the bank account to DE89370400440532013000",
            "Jonathan Meyer",
            "",
        );
        // Typo in the description and a misspelled name: the description
        // stays above the Levenshtein threshold while the name similarity
        // lands between medium and strong.
        let second = item(
            "T-002",
            "Change the bank acount to DE89370400440532013001",
            "Jonathen Mayer",
            "",
        );

        assert!(levenshtein_and_medium_name(&second, &first, &config));
        let cascade = DuplicateCascade::new();
        assert_eq!(
            cascade.matched_rule(&second, &[first]),
            Some("levenshtein_and_medium_name")
        );
    }

    #[test]
    fn test_same_date_rule_needs_medium_jaccard() {
        let config = DedupConfig::default();
        let first = item(
            "T-001",
            "grant a one time bonus of 2000 euro to the employee",
            "Peter Lang",
            "01.12.2025",
        );
        let second = item(
            "T-002",
            "grant a one time bonus of 2000 euro to the staff",
            "Peter Lang",
            "01.12.2025",
        );
        assert!(same_date_jaccard_and_strong_name(&second, &first, &config));

        // Different date: rule 6 cannot fire.
        let third = item(
            "T-003",
            "grant a one time bonus of 2000 euro to the staff",
            "Peter Lang",
            "01.01.2026",
        );
        assert!(!same_date_jaccard_and_strong_name(&third, &first, &config));
    }

    #[test]
    fn test_cascade_is_order_dependent() {
        let cascade = DuplicateCascade::new();
        let x = item("T-001", "Update address for Klaus", "Klaus", "");
        let y = item("T-002", "Update address for Klaus", "Klaus", "");

        // X accepted first: Y is the duplicate.
        assert!(cascade.is_duplicate(&y, &[x.clone()]));
        // Insertion order reversed: X is the duplicate and Y survives.
        assert!(cascade.is_duplicate(&x, &[y]));
    }

    #[test]
    fn test_unrelated_items_are_kept() {
        let cascade = DuplicateCascade::new();
        let first = item("T-001", "Raise salary to 80000", "Anna Becker", "2026");
        let second = item(
            "T-002",
            "Switch health insurance to TK",
            "Jens Vogel",
            "2026",
        );
        assert_eq!(cascade.matched_rule(&second, &[first]), None);
    }

    #[test]
    fn test_date_blind_by_default() {
        // Items identical except for the effective date are collapsed by
        // rule 1. Documented behavior, debatable but accepted.
        let cascade = DuplicateCascade::new();
        let first = item("T-001", "Raise salary to 80000", "Anna Becker", "May 2026");
        let second = item("T-002", "Raise salary to 80000", "Anna Becker", "June 2026");
        assert!(cascade.is_duplicate(&second, &[first]));
    }

    // Disabled pending a product decision on whether a differing effective
    // date should distinguish otherwise-identical items by default.
    #[test]
    #[ignore]
    fn test_date_should_distinguish_identical_items() {
        let cascade = DuplicateCascade::new();
        let first = item("T-001", "Raise salary to 80000", "Anna Becker", "May 2026");
        let second = item("T-002", "Raise salary to 80000", "Anna Becker", "June 2026");
        assert!(!cascade.is_duplicate(&second, &[first]));
    }

    #[test]
    fn test_opt_in_date_distinction() {
        let cascade = DuplicateCascade::with_config(DedupConfig {
            distinguish_effective_date: true,
            ..DedupConfig::default()
        });
        let first = item("T-001", "Raise salary to 80000", "Anna Becker", "May 2026");
        let second = item("T-002", "Raise salary to 80000", "Anna Becker", "June 2026");
        assert!(!cascade.is_duplicate(&second, &[first.clone()]));

        // Same date still deduplicates.
        let third = item("T-003", "Raise salary to 80000", "Anna Becker", "May 2026");
        assert!(cascade.is_duplicate(&third, &[first]));
    }
}
