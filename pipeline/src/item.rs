//! Work items: the discrete units of change extracted from a bulk request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a work item.
///
/// Items are never deleted, only marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Created by extraction, not yet executed.
    Pending,
    /// The associated task has finished (success or failure).
    Completed,
    /// Withdrawn before execution.
    Cancelled,
}

/// The fields a decision action carries before an identifier is assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDraft {
    /// Free-text description of the change, as extracted.
    pub description: String,

    /// Translated description (empty if the source language was already
    /// the target language).
    #[serde(default)]
    pub translated_description: String,

    /// Name of the affected subject (e.g. an employee).
    pub subject_name: String,

    /// Effective date as free text; not necessarily parseable.
    #[serde(default)]
    pub effective_date: String,
}

/// One discrete, independently executable unit of extracted change request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    /// Short, human-scannable identifier, unique within a run (e.g.
    /// `T-003`).
    pub id: String,

    /// Free-text description of the change.
    pub description: String,

    /// Translated description, possibly empty.
    pub translated_description: String,

    /// Name of the affected subject.
    pub subject_name: String,

    /// Effective date as free text.
    pub effective_date: String,

    /// When this item was extracted.
    pub created_at: DateTime<Utc>,

    /// Lifecycle status.
    pub status: ItemStatus,

    /// Identifier of the run that produced this item.
    pub run_id: String,

    /// Correction iteration counter. Starts at 0; reserved for future
    /// correction flows.
    pub iteration: u32,
}

impl WorkItem {
    /// Create a pending work item from a draft.
    pub fn from_draft(id: impl Into<String>, run_id: impl Into<String>, draft: ItemDraft) -> Self {
        Self {
            id: id.into(),
            description: draft.description,
            translated_description: draft.translated_description,
            subject_name: draft.subject_name,
            effective_date: draft.effective_date,
            created_at: Utc::now(),
            status: ItemStatus::Pending,
            run_id: run_id.into(),
            iteration: 0,
        }
    }

    /// The description the cascade and prompts treat as primary: the
    /// translated description when non-empty, else the raw description.
    pub fn primary_description(&self) -> &str {
        if self.translated_description.trim().is_empty() {
            &self.description
        } else {
            &self.translated_description
        }
    }

    /// One-line rendering used when listing accepted items in a prompt.
    pub fn render_line(&self) -> String {
        let date = if self.effective_date.trim().is_empty() {
            "unspecified".to_string()
        } else {
            self.effective_date.clone()
        };
        format!(
            "[{}] {} (subject: {}, effective: {})",
            self.id,
            self.primary_description(),
            self.subject_name,
            date
        )
    }
}
