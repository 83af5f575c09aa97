//! Bounded, overlapping text windows for extraction.
//!
//! The windower splits a bulk request into fixed-size slices of lines so
//! that one extraction round never sees more than a window's worth of
//! text. Consecutive windows overlap so that a change request straddling a
//! window boundary is still seen whole at least once.

use serde::{Deserialize, Serialize};

/// Configuration for the windower.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Number of lines per window.
    pub window_size: usize,

    /// Lines shared between consecutive windows. Must be smaller than
    /// `window_size`; the stride is clamped to at least 1 regardless.
    pub overlap: usize,

    /// Lines with more words than this are re-split into sub-lines of at
    /// most this many words before windowing, so a single dense line
    /// cannot dominate a window.
    pub max_words_per_line: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_size: 5,
            overlap: 2,
            max_words_per_line: 10,
        }
    }
}

/// A bounded, overlapping slice of the input.
///
/// Derived, not persisted: windows exist only while extraction runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Window {
    /// Position of this window in the sequence, starting at 0.
    pub index: usize,

    /// The lines in this window, in input order.
    pub lines: Vec<String>,
}

impl Window {
    /// The window's text, lines re-joined with newlines.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Splits raw input into bounded, overlapping windows of lines.
///
/// Pure and deterministic: the whole input is known up front, so the same
/// input and configuration always produce the same windows.
pub struct Windower {
    config: WindowConfig,
}

impl Windower {
    /// Create a windower with default configuration.
    pub fn new() -> Self {
        Self {
            config: WindowConfig::default(),
        }
    }

    /// Create a windower with custom configuration.
    pub fn with_config(config: WindowConfig) -> Self {
        Self { config }
    }

    /// Split raw text into windows.
    ///
    /// Empty input yields no windows; input shorter than the window size
    /// yields exactly one window containing all lines.
    pub fn split(&self, text: &str) -> Vec<Window> {
        let lines = self.preprocess(text);
        if lines.is_empty() {
            return Vec::new();
        }

        let window_size = self.config.window_size.max(1);
        let stride = window_size.saturating_sub(self.config.overlap).max(1);

        let mut windows = Vec::new();
        let mut start = 0;
        while start < lines.len() {
            let end = (start + window_size).min(lines.len());
            windows.push(Window {
                index: windows.len(),
                lines: lines[start..end].to_vec(),
            });
            if end == lines.len() {
                break;
            }
            start += stride;
        }

        windows
    }

    /// Split input into non-empty lines, re-splitting overly long lines.
    fn preprocess(&self, text: &str) -> Vec<String> {
        let mut out = Vec::new();
        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let words: Vec<&str> = trimmed.split_whitespace().collect();
            if words.len() <= self.config.max_words_per_line {
                out.push(words.join(" "));
            } else {
                for chunk in words.chunks(self.config.max_words_per_line.max(1)) {
                    out.push(chunk.join(" "));
                }
            }
        }
        out
    }
}

impl Default for Windower {
    fn default() -> Self {
        Self::new()
    }
}
