//! Demo of the decomposition pipeline.
//!
//! Usage: cargo run -p fanout-pipeline --example demo
//!
//! Runs the full pipeline over a sample payroll email with a scripted
//! decision engine (no real model call) and a sleep-based task factory.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;

use fanout_pipeline::{
    DecisionAction, DecisionEngine, FanoutPipeline, ItemDraft, LoopVerdict, Result, TaskFactory,
    TaskResult, WorkItem,
};

const BULK_REQUEST: &str = "\
Hello payroll team,
please process the following changes for next month:
Update health insurance provider to AOK Bayern for Thomas
Raise the salary of Anna Becker to 75000 effective May 2026
Switch Jens Vogel to the company pension plan
Update health insurance to AOK Bayern for Thomas
Thanks!";

/// Scripted stand-in for the language model.
struct ScriptedEngine {
    rounds: Mutex<Vec<Vec<DecisionAction>>>,
}

#[async_trait]
impl DecisionEngine for ScriptedEngine {
    async fn decide(&self, _prompt: &str) -> Result<Vec<DecisionAction>> {
        let mut rounds = self.rounds.lock().expect("script lock");
        if rounds.is_empty() {
            Ok(Vec::new())
        } else {
            Ok(rounds.remove(0))
        }
    }

    async fn check_loop(&self, _history: &str, _remaining: &str) -> Result<LoopVerdict> {
        Ok(LoopVerdict::Progressing)
    }
}

fn add_item(description: &str, name: &str, date: &str) -> DecisionAction {
    DecisionAction::AddItem(ItemDraft {
        description: description.to_string(),
        translated_description: String::new(),
        subject_name: name.to_string(),
        effective_date: date.to_string(),
    })
}

/// Pretends to apply each change against a downstream system.
struct SleepFactory;

impl TaskFactory for SleepFactory {
    fn build(&self, item: &WorkItem) -> BoxFuture<'static, TaskResult> {
        let id = item.id.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            println!("   ✓ executed {id}");
            Ok(())
        }
        .boxed()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for logs
    tracing_subscriber::fmt::init();

    println!("🚀 Fanout Decomposition Pipeline Demo\n");

    let engine = Arc::new(ScriptedEngine {
        rounds: Mutex::new(vec![
            vec![
                add_item(
                    "Update health insurance provider to AOK Bayern for Thomas",
                    "Thomas",
                    "October 2025",
                ),
                add_item(
                    "Raise the salary of Anna Becker to 75000",
                    "Anna Becker",
                    "May 2026",
                ),
            ],
            vec![
                add_item(
                    "Switch Jens Vogel to the company pension plan",
                    "Jens Vogel",
                    "",
                ),
                // Re-emitted in different words: the cascade drops it.
                add_item(
                    "Update health insurance to AOK Bayern for Thomas",
                    "Thomas",
                    "October 2025",
                ),
            ],
        ]),
    });

    let pipeline = FanoutPipeline::new(engine, Arc::new(SleepFactory));

    println!("📨 Processing bulk request...");
    let result = pipeline
        .run(BULK_REQUEST, "Payroll email listing employee changes")
        .await?;

    println!("\n📋 Extracted work items:");
    for item in &result.items {
        println!("   • {}", item.render_line());
    }

    println!("\n📊 Run statistics:");
    println!("   ✓ Windows processed: {}", result.stats.extraction.windows);
    println!(
        "   ✓ Decision rounds: {}",
        result.stats.extraction.decision_rounds
    );
    println!(
        "   ✓ Duplicates dropped: {}",
        result.stats.extraction.duplicates_dropped
    );
    println!("   ✓ Tasks succeeded: {}", result.stats.tasks_succeeded);
    println!("   ✓ Tasks failed: {}", result.stats.tasks_failed);
    println!("   ✓ Scheduler steps: {}", result.stats.scheduler_steps);
    println!(
        "   ✓ Processing time: {}ms",
        result.stats.processing_time_ms
    );

    Ok(())
}
