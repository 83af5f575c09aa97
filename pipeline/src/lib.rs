//! # Fanout Pipeline
//!
//! This crate decomposes a single bulk natural-language change request
//! (for example a payroll email listing many employee changes) into
//! discrete, deduplicated work items, then executes each item as an
//! independent unit of work under a bounded concurrency budget.
//!
//! It is a library with no network, file, or CLI surface of its own; a
//! host pipeline provides the language-model decision engine and the
//! per-item task factory, and receives aggregated per-item outcomes.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Decomposition Pipeline                     │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  raw text ──► Windower ──► ItemExtractor ◄──► DecisionEngine    │
//! │                                 │                               │
//! │                                 ▼                               │
//! │                          DuplicateCascade                       │
//! │                                 │                               │
//! │                                 ▼                               │
//! │  TaskFactory ──► Scheduler ──► per-item ItemOutcome             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Extraction is sequential (later windows see earlier items) and
//! watchdog-guarded against decision engines that loop without progress;
//! the scheduler is a repeatedly-invoked step function that starts tasks
//! up to the concurrency bound and waits for at most one completion per
//! step.

pub mod decision;
pub mod dedup;
pub mod error;
pub mod extraction;
pub mod item;
pub mod pipeline;
pub mod scheduler;
pub mod window;

pub use decision::{DecisionAction, DecisionEngine, LoopVerdict};
pub use dedup::{DedupConfig, DuplicateCascade};
pub use error::{PipelineError, Result};
pub use extraction::{ExtractionConfig, ExtractionResult, ExtractionStats, ItemExtractor};
pub use item::{ItemDraft, ItemStatus, WorkItem};
pub use pipeline::{FanoutPipeline, PipelineConfig, PipelineResult, PipelineStats};
pub use scheduler::{
    HandleState, ItemOutcome, Scheduler, SchedulerConfig, StepOutcome, TaskFactory, TaskHandle,
    TaskResult,
};
pub use window::{Window, WindowConfig, Windower};
