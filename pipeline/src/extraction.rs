//! The windowed, watchdog-guarded extraction loop.
//!
//! Extraction is strictly sequential: windows are processed in input
//! order, and each window runs decision rounds one at a time, because
//! later windows see the items accumulated by earlier ones. Per window the
//! loop is a small state machine, `EXTRACTING -> LOOP_CHECK ->
//! (EXTRACTING | DONE)`: it keeps asking the decision engine for actions
//! until a round emits none, and every few rounds a watchdog asks a second
//! question — is the engine repeating itself? A "repeating" verdict
//! force-terminates the window. This bounds the worst case against engines
//! that re-emit the same conclusion in slightly different wording, while
//! legitimately dense windows still get many rounds.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::decision::{DecisionAction, DecisionEngine, LoopVerdict};
use crate::dedup::DuplicateCascade;
use crate::error::{PipelineError, Result};
use crate::item::{ItemDraft, WorkItem};
use crate::window::{Window, Windower};

/// Configuration for the extraction loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Run the watchdog loop check every this many decision rounds.
    pub watchdog_interval: usize,

    /// Prefix for item identifiers (`T` yields `T-001`, `T-002`, ...).
    pub id_prefix: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            watchdog_interval: 2,
            id_prefix: "T".to_string(),
        }
    }
}

/// Counters describing one extraction run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Windows processed.
    pub windows: usize,

    /// Decision rounds across all windows.
    pub decision_rounds: usize,

    /// Windows force-terminated by the watchdog.
    pub watchdog_halts: usize,

    /// Candidates dropped by the duplicate cascade.
    pub duplicates_dropped: usize,

    /// Decision-engine calls that failed and were skipped.
    pub decision_errors: usize,

    /// Actions that could not be applied and were skipped.
    pub action_errors: usize,
}

/// The items and counters produced by one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Identifier of this run.
    pub run_id: String,

    /// Accumulated, deduplicated items in window order.
    pub items: Vec<WorkItem>,

    /// Run counters.
    pub stats: ExtractionStats,
}

/// Accumulator threaded through the sequential window loop.
///
/// Owned by the extractor for the duration of a run; the item list has a
/// single writer.
struct RunState {
    run_id: String,
    general_context: String,
    items: Vec<WorkItem>,
    next_seq: usize,
    stats: ExtractionStats,
}

/// Per-window loop-guard state: the round counter and the history of
/// attempted emissions since window start. Reset for every window.
#[derive(Default)]
struct WindowGuard {
    rounds: usize,
    history: Vec<String>,
}

impl WindowGuard {
    fn rendered_history(&self) -> String {
        self.history.join("\n")
    }
}

/// Turns free text into structured work items via the decision engine.
pub struct ItemExtractor {
    config: ExtractionConfig,
    windower: Windower,
    cascade: DuplicateCascade,
    engine: Arc<dyn DecisionEngine>,
}

impl ItemExtractor {
    /// Create an extractor with default windowing, cascade, and loop
    /// configuration.
    pub fn new(engine: Arc<dyn DecisionEngine>) -> Self {
        Self {
            config: ExtractionConfig::default(),
            windower: Windower::new(),
            cascade: DuplicateCascade::new(),
            engine,
        }
    }

    /// Create an extractor with custom components.
    pub fn with_components(
        config: ExtractionConfig,
        windower: Windower,
        cascade: DuplicateCascade,
        engine: Arc<dyn DecisionEngine>,
    ) -> Self {
        Self {
            config,
            windower,
            cascade,
            engine,
        }
    }

    /// Extract work items from a bulk request.
    ///
    /// `general_context` is an immutable summary of the whole input,
    /// computed once before windowing; it is included in every extraction
    /// prompt. The returned item list reflects windows in input order.
    pub async fn extract(
        &self,
        text: &str,
        general_context: &str,
        run_id: &str,
    ) -> Result<ExtractionResult> {
        let windows = self.windower.split(text);
        info!(run_id, windows = windows.len(), "starting extraction");

        let mut run = RunState {
            run_id: run_id.to_string(),
            general_context: general_context.to_string(),
            items: Vec::new(),
            next_seq: 1,
            stats: ExtractionStats::default(),
        };

        for window in &windows {
            self.process_window(window, &mut run).await;
            run.stats.windows += 1;
        }

        info!(
            run_id,
            items = run.items.len(),
            rounds = run.stats.decision_rounds,
            duplicates = run.stats.duplicates_dropped,
            "extraction finished"
        );

        Ok(ExtractionResult {
            run_id: run.run_id,
            items: run.items,
            stats: run.stats,
        })
    }

    /// Run the per-window extraction loop to its DONE state.
    ///
    /// Never returns an error: decision failures skip the rest of the
    /// window and action failures skip the action, so one bad round cannot
    /// lose already-accumulated items.
    async fn process_window(&self, window: &Window, run: &mut RunState) {
        let mut guard = WindowGuard::default();
        let watchdog_interval = self.config.watchdog_interval.max(1);

        loop {
            // EXTRACTING
            let prompt =
                render_extraction_prompt(&run.general_context, &window.text(), &run.items);
            let actions = match self.engine.decide(&prompt).await {
                Ok(actions) => actions,
                Err(err) => {
                    warn!(
                        window = window.index,
                        error = %err,
                        "decision engine failed, skipping rest of window"
                    );
                    run.stats.decision_errors += 1;
                    return;
                }
            };
            guard.rounds += 1;
            run.stats.decision_rounds += 1;

            // A zero-action round is the only natural exit.
            if actions.is_empty() {
                debug!(window = window.index, rounds = guard.rounds, "window done");
                return;
            }

            for action in actions {
                guard.history.push(action.render());
                if let Err(err) = self.apply_action(action, run) {
                    warn!(
                        window = window.index,
                        error = %err,
                        "failed to apply action, continuing"
                    );
                    run.stats.action_errors += 1;
                }
            }

            // LOOP_CHECK
            if guard.rounds % watchdog_interval == 0 {
                let verdict = match self
                    .engine
                    .check_loop(&guard.rendered_history(), &window.text())
                    .await
                {
                    Ok(verdict) => verdict,
                    Err(err) => {
                        warn!(
                            window = window.index,
                            error = %err,
                            "loop check failed, assuming progress"
                        );
                        run.stats.decision_errors += 1;
                        LoopVerdict::Progressing
                    }
                };

                if verdict == LoopVerdict::Repeating {
                    warn!(
                        window = window.index,
                        rounds = guard.rounds,
                        "watchdog verdict: repeating, terminating window"
                    );
                    run.stats.watchdog_halts += 1;
                    return;
                }
            }
        }
    }

    /// Apply one emitted action to the accumulated item list.
    fn apply_action(&self, action: DecisionAction, run: &mut RunState) -> Result<()> {
        match action {
            DecisionAction::AddItem(draft) => self.apply_add_item(draft, run),
        }
    }

    fn apply_add_item(&self, draft: ItemDraft, run: &mut RunState) -> Result<()> {
        if draft.description.trim().is_empty() {
            return Err(PipelineError::ActionApply(
                "item draft has an empty description".to_string(),
            ));
        }
        if draft.subject_name.trim().is_empty() {
            return Err(PipelineError::ActionApply(format!(
                "item draft '{}' has no subject name",
                draft.description
            )));
        }

        let id = format!("{}-{:03}", self.config.id_prefix, run.next_seq);
        let candidate = WorkItem::from_draft(id, run.run_id.clone(), draft);

        if self.cascade.is_duplicate(&candidate, &run.items) {
            run.stats.duplicates_dropped += 1;
            return Ok(());
        }

        debug!(id = %candidate.id, subject = %candidate.subject_name, "item accepted");
        run.next_seq += 1;
        run.items.push(candidate);
        Ok(())
    }
}

/// Render the prompt for one extraction round.
fn render_extraction_prompt(general_context: &str, window_text: &str, accepted: &[WorkItem]) -> String {
    let mut prompt = String::new();
    prompt.push_str("General context:\n");
    prompt.push_str(general_context);
    prompt.push_str("\n\nAlready extracted items:\n");
    if accepted.is_empty() {
        prompt.push_str("(none)\n");
    } else {
        for item in accepted {
            prompt.push_str(&item.render_line());
            prompt.push('\n');
        }
    }
    prompt.push_str("\nCurrent text window:\n");
    prompt.push_str(window_text);
    prompt.push_str(
        "\n\nEmit one add_item action per new discrete change request in the window. \
         Emit no actions if every change in the window is already covered.",
    );
    prompt
}
