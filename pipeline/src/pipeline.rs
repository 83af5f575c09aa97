//! End-to-end pipeline orchestration.
//!
//! This module provides the single entry point for hosts that want the
//! full flow in one call: window the bulk request, extract and
//! deduplicate work items, then execute them under the concurrency
//! budget and aggregate the outcomes.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::decision::DecisionEngine;
use crate::dedup::{DedupConfig, DuplicateCascade};
use crate::error::Result;
use crate::extraction::{ExtractionConfig, ExtractionStats, ItemExtractor};
use crate::item::WorkItem;
use crate::scheduler::{ItemOutcome, Scheduler, SchedulerConfig, TaskFactory};
use crate::window::{WindowConfig, Windower};

/// Configuration for the full pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Windower configuration.
    pub window: WindowConfig,

    /// Extraction loop configuration.
    pub extraction: ExtractionConfig,

    /// Duplicate cascade thresholds.
    pub dedup: DedupConfig,

    /// Scheduler configuration.
    pub scheduler: SchedulerConfig,
}

/// Statistics about one pipeline run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PipelineStats {
    /// Extraction counters.
    pub extraction: ExtractionStats,

    /// Items handed to the scheduler.
    pub items_scheduled: usize,

    /// Scheduler steps taken to completion.
    pub scheduler_steps: usize,

    /// Tasks that succeeded.
    pub tasks_succeeded: usize,

    /// Tasks that failed.
    pub tasks_failed: usize,

    /// Total processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Result of running the full pipeline.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Identifier of this run.
    pub run_id: String,

    /// All work items, statuses updated by the scheduler.
    pub items: Vec<WorkItem>,

    /// Per-item outcomes in completion order.
    pub outcomes: Vec<ItemOutcome>,

    /// Run statistics.
    pub stats: PipelineStats,
}

/// The full decomposition pipeline: windower, extraction loop, duplicate
/// cascade, and bounded-concurrency scheduler wired together.
pub struct FanoutPipeline {
    config: PipelineConfig,
    engine: Arc<dyn DecisionEngine>,
    factory: Arc<dyn TaskFactory>,
}

impl FanoutPipeline {
    /// Create a pipeline with default configuration.
    pub fn new(engine: Arc<dyn DecisionEngine>, factory: Arc<dyn TaskFactory>) -> Self {
        Self {
            config: PipelineConfig::default(),
            engine,
            factory,
        }
    }

    /// Create a pipeline with custom configuration.
    pub fn with_config(
        config: PipelineConfig,
        engine: Arc<dyn DecisionEngine>,
        factory: Arc<dyn TaskFactory>,
    ) -> Self {
        Self {
            config,
            engine,
            factory,
        }
    }

    /// Run the pipeline over one bulk request.
    ///
    /// `general_context` is the immutable whole-input summary included in
    /// every extraction prompt. A fresh run identifier is generated; all
    /// extracted items carry it.
    pub async fn run(&self, text: &str, general_context: &str) -> Result<PipelineResult> {
        let run_id = Uuid::new_v4().to_string();
        self.run_with_id(text, general_context, &run_id).await
    }

    /// Run the pipeline with a caller-provided run identifier.
    pub async fn run_with_id(
        &self,
        text: &str,
        general_context: &str,
        run_id: &str,
    ) -> Result<PipelineResult> {
        let start = Instant::now();
        info!(run_id, "pipeline run starting");

        let extractor = ItemExtractor::with_components(
            self.config.extraction.clone(),
            Windower::with_config(self.config.window.clone()),
            DuplicateCascade::with_config(self.config.dedup.clone()),
            Arc::clone(&self.engine),
        );
        let extraction = extractor.extract(text, general_context, run_id).await?;

        // Handoff: the finished item list moves to the scheduler and is
        // read-only from here apart from status transitions.
        let items_scheduled = extraction.items.len();
        let mut scheduler = Scheduler::with_config(
            extraction.items,
            Arc::clone(&self.factory),
            self.config.scheduler.clone(),
        );
        let scheduler_steps = scheduler.run_to_completion().await?;
        let (items, outcomes) = scheduler.into_results();

        let tasks_succeeded = outcomes.iter().filter(|o| o.success).count();
        let tasks_failed = outcomes.len() - tasks_succeeded;
        let stats = PipelineStats {
            extraction: extraction.stats,
            items_scheduled,
            scheduler_steps,
            tasks_succeeded,
            tasks_failed,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            run_id,
            items = items.len(),
            succeeded = tasks_succeeded,
            failed = tasks_failed,
            elapsed_ms = stats.processing_time_ms,
            "pipeline run complete"
        );

        Ok(PipelineResult {
            run_id: run_id.to_string(),
            items,
            outcomes,
            stats,
        })
    }
}
