//! Worker pool: N identical workers draining the shared queue.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, trace, warn};

use crate::domain::{ExecResult, Task, TaskKind, WorkerId};
use crate::queue::TaskQueue;
use crate::steps::{ExecContext, StepRegistry};
use crate::timekeeper::Timekeeper;

/// Upper bound on one idle wait, so a stop request is observed promptly even
/// when a wake-up went missing.
const IDLE_WAIT: Duration = Duration::from_millis(500);

/// Worker pool handle.
/// - `request_shutdown()` stops workers between tasks; in-flight work runs to
///   completion.
/// - `shutdown_and_join()` waits for every worker to exit.
pub struct WorkerGroup {
    shutdown_tx: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
}

impl WorkerGroup {
    /// Spawn `n` workers against the shared queue. Each worker owns its
    /// execution context; the context is dropped when the worker exits.
    pub fn spawn(
        n: usize,
        queue: Arc<TaskQueue>,
        registry: Arc<StepRegistry>,
        timekeeper: Arc<dyn Timekeeper>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut joins = Vec::with_capacity(n);
        for id in 1..=n {
            let worker = WorkerId::new(id);
            let queue = Arc::clone(&queue);
            let ctx = ExecContext::new(Arc::clone(&registry));
            let timekeeper = Arc::clone(&timekeeper);
            let rx = shutdown_rx.clone();

            joins.push(tokio::spawn(worker_loop(worker, queue, ctx, timekeeper, rx)));
        }

        Self { shutdown_tx, joins }
    }

    /// Number of workers spawned.
    pub fn size(&self) -> usize {
        self.joins.len()
    }

    /// Ask every worker to stop after its current task.
    pub fn request_shutdown(&self) {
        // ignore send error: receivers may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    /// Stop and wait for all workers.
    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        for join in self.joins {
            let _ = join.await;
        }
    }
}

async fn worker_loop(
    id: WorkerId,
    queue: Arc<TaskQueue>,
    mut ctx: ExecContext,
    timekeeper: Arc<dyn Timekeeper>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    queue.register_worker().await;
    info!(worker = id.get(), "preprocessing worker started");

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let Some(mut claimed) = queue.claim().await else {
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    // A closed channel means the pool handle is gone; stop.
                    if changed.is_err() {
                        break;
                    }
                }
                _ = queue.wait_for_work(IDLE_WAIT) => {}
            }
            continue;
        };

        let task = claimed.task_mut();
        trace!(
            worker = id.get(),
            task = %task.id,
            item = %task.item_id,
            kind = task.kind.name(),
            "process task"
        );

        timekeeper.mark_busy(id, Utc::now());
        let outcome = catch_unwind(AssertUnwindSafe(|| process(&mut ctx, &mut *task)));
        timekeeper.mark_idle(id, Utc::now());

        // A panicking step evaluator must not lose the task: it completes
        // with an error result and flows through finish() as usual.
        if let Err(panic) = outcome {
            let message = format!("step evaluator panicked: {}", panic_message(&panic));
            warn!(worker = id.get(), task = %task.id, error = %message, "task failed");
            if task.result().is_none() {
                task.set_result(ExecResult::failure(message, Utc::now()));
            }
        }

        queue.finish(claimed).await;
    }

    queue.deregister_worker().await;
    info!(worker = id.get(), "preprocessing worker stopped");
}

/// Dispatch one claimed task by kind and fill its result slot.
fn process(ctx: &mut ExecContext, task: &mut Task) {
    let item = task.item_id;

    match &mut task.kind {
        TaskKind::Test(t) => {
            let (result, history) = ctx.execute_traced(item, &t.steps, &t.input);
            t.history = history;
            t.result = Some(result);
        }
        TaskKind::Value(v) | TaskKind::ValueSeq(v) => {
            v.result = Some(ctx.execute(item, &v.steps, &v.input, v.cache.as_deref()));
        }
        TaskKind::Dependent(d) => {
            // The primary's pipeline and input; only the cache placement uses
            // the dependent's own item id.
            d.result = Some(ctx.execute(
                item,
                &d.primary.steps,
                &d.primary.input,
                d.cache.as_deref(),
            ));
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
