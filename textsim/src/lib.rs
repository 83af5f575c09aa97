//! # Text Similarity
//!
//! This crate provides the lexical similarity primitives used by the Fanout
//! duplicate cascade.
//!
//! ## Features
//!
//! - **Normalization**: Case folding, punctuation stripping, whitespace collapse
//! - **Edit Distance**: Levenshtein distance and similarity ratio
//! - **Set Similarity**: Jaccard index over normalized word sets
//! - **Overlap Statistics**: Shared-word counts against the smaller set
//!
//! All functions are pure and infallible: any pair of strings has a defined
//! similarity. There is no model or embedding involved; the cascade built on
//! top of these primitives is a fixed set of hand-tuned heuristics.

pub mod metrics;
pub mod normalize;

pub use metrics::{jaccard, levenshtein, levenshtein_ratio, word_overlap, WordOverlap};
pub use normalize::{normalize, word_set};
