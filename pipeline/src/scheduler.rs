//! Bounded-concurrency execution of deduplicated work items.
//!
//! The scheduler is a repeatedly-invoked step function over visible state,
//! not a blocking executor: each [`Scheduler::step`] either starts as many
//! idle tasks as spare capacity allows (without waiting on any of them) or
//! waits for exactly one running task to finish. Waiting for at most one
//! completion per step keeps a step's latency bounded by the fastest
//! outstanding task rather than the slowest. [`Scheduler::run_to_completion`]
//! is the conventional driver on top.
//!
//! Failure is not retried: a failing or panicking task still marks its
//! handle processed and its item completed, and the failure is surfaced in
//! the per-item outcome. Cancellation mid-flight is not supported; ceasing
//! to call `step` only prevents new starts.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::item::{ItemStatus, WorkItem};

/// Result of one scheduled task: success, or failure with a message.
pub type TaskResult = std::result::Result<(), String>;

/// Produces the asynchronous unit of work for one item.
///
/// The returned future is not started until the scheduler spawns it.
pub trait TaskFactory: Send + Sync {
    /// Build the task for `item`.
    fn build(&self, item: &WorkItem) -> BoxFuture<'static, TaskResult>;
}

impl<F> TaskFactory for F
where
    F: Fn(&WorkItem) -> BoxFuture<'static, TaskResult> + Send + Sync,
{
    fn build(&self, item: &WorkItem) -> BoxFuture<'static, TaskResult> {
        self(item)
    }
}

/// Configuration for the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum number of tasks running at any time.
    pub max_concurrent: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { max_concurrent: 5 }
    }
}

/// Execution state of one handle. Transitions idle -> running ->
/// processed, never backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleState {
    /// Not started.
    Idle,
    /// Task spawned, not yet finished.
    Running,
    /// Task finished (success or failure).
    Processed,
}

/// The scheduler's bookkeeping record for one work item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskHandle {
    /// Equal to the id of the work item this handle represents.
    pub id: String,

    /// Current execution state.
    pub state: HandleState,
}

/// Aggregated outcome for one item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemOutcome {
    /// The item this outcome belongs to.
    pub item_id: String,

    /// Whether the task succeeded.
    pub success: bool,

    /// Failure message, if any.
    pub error: Option<String>,
}

/// What one step invocation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Started this many idle tasks without waiting on any of them.
    Started(usize),

    /// Waited for one running task; this item finished.
    Finished {
        /// The item whose task completed.
        item_id: String,
        /// Whether it succeeded.
        success: bool,
    },

    /// Every handle is processed. Terminal; further steps return this
    /// again.
    Complete,
}

/// Bounded-concurrency step scheduler over a fixed item list.
///
/// The scheduler owns the handle array and is its sole mutator; the item
/// list is read-only input apart from the pending -> completed status
/// transition applied as each task finishes.
pub struct Scheduler {
    config: SchedulerConfig,
    factory: Arc<dyn TaskFactory>,
    items: Vec<WorkItem>,
    handles: Vec<TaskHandle>,
    running: JoinSet<(usize, TaskResult)>,
    task_index: HashMap<tokio::task::Id, usize>,
    outcomes: Vec<ItemOutcome>,
}

impl Scheduler {
    /// Create a scheduler over `items` with default configuration.
    pub fn new(items: Vec<WorkItem>, factory: Arc<dyn TaskFactory>) -> Self {
        Self::with_config(items, factory, SchedulerConfig::default())
    }

    /// Create a scheduler with custom configuration.
    pub fn with_config(
        items: Vec<WorkItem>,
        factory: Arc<dyn TaskFactory>,
        config: SchedulerConfig,
    ) -> Self {
        let handles = items
            .iter()
            .map(|item| TaskHandle {
                id: item.id.clone(),
                state: HandleState::Idle,
            })
            .collect();
        Self {
            config,
            factory,
            items,
            handles,
            running: JoinSet::new(),
            task_index: HashMap::new(),
            outcomes: Vec::new(),
        }
    }

    /// Current handle states, for observation.
    pub fn handles(&self) -> &[TaskHandle] {
        &self.handles
    }

    /// Number of tasks currently running.
    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    /// Outcomes collected so far, in completion order.
    pub fn outcomes(&self) -> &[ItemOutcome] {
        &self.outcomes
    }

    /// Execute one scheduling step.
    ///
    /// Either starts as many idle tasks as capacity allows (returning
    /// without waiting), or waits for exactly one completion. Safe to call
    /// again after `Complete`.
    pub async fn step(&mut self) -> Result<StepOutcome> {
        // 1. Everything processed (or nothing to do): terminal.
        if self
            .handles
            .iter()
            .all(|h| h.state == HandleState::Processed)
        {
            return Ok(StepOutcome::Complete);
        }

        // 2./3. Spare capacity and idle handles: start without blocking.
        let running = self.running.len();
        let capacity = self.config.max_concurrent.saturating_sub(running);
        let idle: Vec<usize> = self
            .handles
            .iter()
            .enumerate()
            .filter(|(_, h)| h.state == HandleState::Idle)
            .map(|(i, _)| i)
            .collect();

        if capacity > 0 && !idle.is_empty() {
            let mut started = 0;
            for index in idle.into_iter().take(capacity) {
                self.start(index);
                started += 1;
            }
            debug!(started, running = self.running.len(), "started idle tasks");
            return Ok(StepOutcome::Started(started));
        }

        // 4. No capacity (or no idle handles): wait for exactly one
        // completion.
        if let Some(joined) = self.running.join_next_with_id().await {
            let (index, result) = match joined {
                Ok((task_id, (index, result))) => {
                    self.task_index.remove(&task_id);
                    (index, result)
                }
                Err(join_err) => {
                    // A panicked task still counts as finished.
                    let index = self.task_index.remove(&join_err.id()).unwrap_or_default();
                    warn!(error = %join_err, "task panicked");
                    (index, Err(format!("task panicked: {join_err}")))
                }
            };
            return Ok(self.finish(index, result));
        }

        // 5. Defensive: not complete, nothing running, yet step 3 did not
        // start anything (e.g. max_concurrent of 0). Start one idle handle
        // so the run cannot stall.
        if let Some(index) = self
            .handles
            .iter()
            .position(|h| h.state == HandleState::Idle)
        {
            self.start(index);
            return Ok(StepOutcome::Started(1));
        }

        Ok(StepOutcome::Complete)
    }

    /// Drive `step` until completion; returns total steps taken.
    pub async fn run_to_completion(&mut self) -> Result<usize> {
        let mut steps = 0;
        loop {
            steps += 1;
            if self.step().await? == StepOutcome::Complete {
                break;
            }
        }
        let failed = self.outcomes.iter().filter(|o| !o.success).count();
        info!(
            items = self.items.len(),
            steps,
            failed,
            "scheduler run complete"
        );
        Ok(steps)
    }

    /// Consume the scheduler, returning the items (statuses updated) and
    /// the collected outcomes.
    pub fn into_results(self) -> (Vec<WorkItem>, Vec<ItemOutcome>) {
        (self.items, self.outcomes)
    }

    fn start(&mut self, index: usize) {
        let task = self.factory.build(&self.items[index]);
        let handle = self.running.spawn(async move { (index, task.await) });
        self.task_index.insert(handle.id(), index);
        self.handles[index].state = HandleState::Running;
        debug!(id = %self.handles[index].id, "task started");
    }

    fn finish(&mut self, index: usize, result: TaskResult) -> StepOutcome {
        self.handles[index].state = HandleState::Processed;
        self.items[index].status = ItemStatus::Completed;

        let item_id = self.handles[index].id.clone();
        let success = result.is_ok();
        let error = result.err();
        if let Some(message) = &error {
            warn!(id = %item_id, error = %message, "task failed");
        } else {
            debug!(id = %item_id, "task finished");
        }
        self.outcomes.push(ItemOutcome {
            item_id: item_id.clone(),
            success,
            error,
        });

        StepOutcome::Finished { item_id, success }
    }
}
