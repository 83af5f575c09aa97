//! The language-model decision boundary.
//!
//! The pipeline never talks to a model directly; it goes through the
//! [`DecisionEngine`] trait, which turns a rendered prompt into zero or
//! more structured actions, and answers the watchdog's loop check. Tests
//! drive the pipeline with scripted engines.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::item::ItemDraft;

/// A structured action emitted by the decision engine.
///
/// The catalogue is closed: the engine can only add items. A round that
/// emits no actions signals that the current window is fully processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DecisionAction {
    /// Add one extracted work item.
    AddItem(ItemDraft),
}

impl DecisionAction {
    /// Short rendering for the per-window action history.
    pub fn render(&self) -> String {
        match self {
            Self::AddItem(draft) => format!(
                "add_item: {} (subject: {})",
                draft.description, draft.subject_name
            ),
        }
    }
}

/// Verdict of the watchdog's loop check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopVerdict {
    /// The extraction loop is re-emitting the same conclusions without
    /// making progress; the current window must be force-terminated.
    Repeating,
    /// The loop is still making progress.
    Progressing,
}

/// The language-model decision function, treated as a black box.
///
/// `decide` receives a fully rendered prompt (window text, general
/// context, items accepted so far) and returns the actions to apply.
/// `check_loop` is the watchdog's binary question: given the action
/// history since window start and the text still being worked, is the
/// actor repeating itself?
///
/// Implementations must be deterministic enough to be testable with a
/// stub that returns a scripted sequence of responses.
#[async_trait]
pub trait DecisionEngine: Send + Sync {
    /// Produce zero or more actions for the given prompt.
    async fn decide(&self, prompt: &str) -> Result<Vec<DecisionAction>>;

    /// Judge whether the extraction loop is repeating itself.
    async fn check_loop(&self, history: &str, remaining: &str) -> Result<LoopVerdict>;
}
