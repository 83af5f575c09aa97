//! Text normalization for similarity comparison.
//!
//! All cascade rules compare *normalized* text: lowercase, punctuation
//! replaced by whitespace, runs of whitespace collapsed, leading and
//! trailing whitespace trimmed. Two strings that normalize identically are
//! considered textually equal.

use std::collections::HashSet;

/// Normalize a string for comparison.
///
/// - Lowercases all characters
/// - Replaces any non-alphanumeric character with a space
/// - Collapses consecutive whitespace into a single space
/// - Trims leading and trailing whitespace
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = true;

    for c in text.chars() {
        if c.is_alphanumeric() {
            for lower in c.to_lowercase() {
                out.push(lower);
            }
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }

    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// The set of distinct normalized words in a string.
pub fn word_set(text: &str) -> HashSet<String> {
    normalize(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
