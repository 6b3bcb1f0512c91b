//! Demo harness: wires a small step registry, feeds the scheduler a mix of
//! tasks, and prints what comes back on the finished lane.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use sluice_core::config::SchedulerConfig;
use sluice_core::domain::{ItemId, Primary, Sample, Step, StepKind, Task, TaskKind, Value};
use sluice_core::scheduler::Scheduler;
use sluice_core::steps::{StepHandler, StepOutput, StepRegistry};
use sluice_core::timekeeper::UsageLedger;

#[derive(Debug, Deserialize)]
struct ScaleParams {
    factor: f64,
}

/// Multiplies numeric samples by a configured factor.
struct ScaleStep;

impl StepHandler for ScaleStep {
    fn apply(&self, sample: Sample, params: &serde_json::Value) -> Result<StepOutput, String> {
        let p: ScaleParams =
            serde_json::from_value(params.clone()).map_err(|e| format!("bad params: {e}"))?;

        let scaled = match sample.value {
            Value::Float(v) => Value::Float(v * p.factor),
            Value::UInt(v) => Value::Float(v as f64 * p.factor),
            other => return Err(format!("cannot scale {} value", other.type_name())),
        };
        Ok(StepOutput::Next(Sample::new(scaled, sample.ts)))
    }
}

#[derive(Debug, Deserialize)]
struct DeadbandParams {
    threshold: f64,
}

/// Discards numeric samples below a threshold.
struct DeadbandStep;

impl StepHandler for DeadbandStep {
    fn apply(&self, sample: Sample, params: &serde_json::Value) -> Result<StepOutput, String> {
        let p: DeadbandParams =
            serde_json::from_value(params.clone()).map_err(|e| format!("bad params: {e}"))?;

        let v = match sample.value {
            Value::Float(v) => v,
            Value::UInt(v) => v as f64,
            ref other => return Err(format!("cannot compare {} value", other.type_name())),
        };

        if v < p.threshold {
            Ok(StepOutput::Discard)
        } else {
            Ok(StepOutput::Next(sample))
        }
    }
}

fn scale(factor: f64) -> Step {
    Step::new("scale", serde_json::json!({ "factor": factor }))
}

fn deadband(threshold: f64) -> Step {
    Step::new("deadband", serde_json::json!({ "threshold": threshold }))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // (A) Step registry: what pipelines may do.
    let mut registry = StepRegistry::new();
    registry.register(StepKind::new("scale"), Arc::new(ScaleStep))?;
    registry.register(StepKind::new("deadband"), Arc::new(DeadbandStep))?;

    // (B) Scheduler with 4 workers and a usage ledger.
    let workers = 4;
    let ledger = Arc::new(UsageLedger::new(workers));
    let scheduler = Scheduler::start(
        SchedulerConfig {
            workers,
            cache_capacity: 256,
        },
        Arc::new(registry),
        Arc::clone(&ledger) as Arc<dyn sluice_core::timekeeper::Timekeeper>,
    )?;
    let cache = scheduler.cache();

    let mut expected = 0usize;

    // (C) Independent value tasks: scale CPU readings, drop idle noise.
    for (item, reading) in [(101u64, 0.42), (102, 0.03), (103, 0.87)] {
        scheduler
            .enqueue(Task::value(
                ItemId::new(item),
                vec![deadband(0.05), scale(100.0)],
                Sample::now(Value::Float(reading)),
                Some(Arc::clone(&cache)),
            ))
            .await;
        expected += 1;
    }

    // (D) An ordered stream: counter samples for one item must complete in
    // submission order.
    for tick in 0..5u64 {
        scheduler
            .enqueue(Task::value_seq(
                ItemId::new(200),
                vec![scale(8.0)],
                Sample::now(Value::UInt(tick)),
                Some(Arc::clone(&cache)),
            ))
            .await;
        expected += 1;
    }

    // (E) A pipeline test with per-step history, for "try this pipeline" UIs.
    scheduler
        .enqueue(Task::test(
            ItemId::new(300),
            vec![scale(2.0), scale(3.0)],
            Sample::now(Value::Float(1.5)),
        ))
        .await;
    expected += 1;

    // (F) Harvest. On a master item's completion, the supervisor schedules
    // the dependent derivation; here item 900 derives from item 101.
    let mut dependent_sent = false;
    let mut seen = 0usize;

    while seen < expected {
        scheduler.wait_finished(Duration::from_millis(100)).await;

        for task in scheduler.fetch_finished().await {
            seen += 1;
            report(&task);

            if task.item_id == ItemId::new(101) && !dependent_sent {
                dependent_sent = true;
                expected += 1;

                let primary = Arc::new(Primary {
                    item_id: task.item_id,
                    steps: vec![deadband(0.05), scale(100.0)],
                    input: Sample::now(Value::Float(0.42)),
                });
                scheduler
                    .enqueue(Task::dependent(
                        ItemId::new(900),
                        primary,
                        Some(Arc::clone(&cache)),
                    ))
                    .await;
            }
        }
    }

    // (G) Show the fanout result and wind down.
    if let Some(sample) = cache.get(ItemId::new(900)) {
        println!("cache[900] = {}", sample.value);
    }

    let leftovers = scheduler.shutdown().await;
    println!("leftover finished tasks after shutdown: {}", leftovers.len());

    for id in 1..=workers {
        let worker = sluice_core::domain::WorkerId::new(id);
        println!(
            "worker {id} busy for {} ms over {} transitions",
            ledger.busy_time(worker).num_milliseconds(),
            ledger.transitions(worker)
        );
    }

    Ok(())
}

fn report(task: &Task) {
    let Some(result) = task.result() else {
        println!("item {}: no result?", task.item_id);
        return;
    };

    match &task.kind {
        TaskKind::Test(t) => {
            println!(
                "item {}: test pipeline -> {} ({} steps recorded)",
                task.item_id,
                result.sample.value,
                t.history.len()
            );
            for (i, record) in t.history.iter().enumerate() {
                println!("    after step {}: {}", i + 1, record.sample.value);
            }
        }
        _ => match &result.error {
            Some(error) => println!("item {}: failed: {error}", task.item_id),
            None => println!(
                "item {}: {} -> {} ({:?})",
                task.item_id,
                task.kind.name(),
                result.sample.value,
                result.disposition
            ),
        },
    }
}
