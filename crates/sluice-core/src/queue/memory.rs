//! The shared task queue.
//!
//! One mutex serializes every lane mutation; two notifies carry the wake-ups
//! (workers wait for pending work, the supervisor may wait for finished
//! tasks). Waits are bounded so a stopping process is observed promptly even
//! if a wake-up is missed.

use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tracing::trace;

use crate::domain::Task;
use crate::observability::QueueDepths;
use crate::queue::state::{Claimed, QueueState};

/// The four-lane preprocessing task queue shared by all workers.
#[derive(Debug, Default)]
pub struct TaskQueue {
    state: Mutex<QueueState>,
    work_available: Notify,
    finished_available: Notify,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand a task over to the queue; ownership transfers with it.
    ///
    /// Ordered tasks for an item with a stream already in flight queue up
    /// behind it without waking anyone; everything else surfaces as runnable
    /// work immediately.
    pub async fn enqueue(&self, task: Task) {
        trace!(task = %task.id, item = %task.item_id, kind = task.kind.name(), "enqueue");

        let surfaced = self.state.lock().await.enqueue(task);
        if surfaced {
            self.work_available.notify_one();
        }
    }

    /// Pop the next runnable unit, or `None` when the pending lane is empty.
    pub async fn claim(&self) -> Option<Claimed> {
        self.state.lock().await.claim()
    }

    /// Return an executed unit. The task surfaces on the finished lane; an
    /// ordered stream's token requeues when more of its sub-tasks wait.
    pub async fn finish(&self, claimed: Claimed) {
        let requeued = self.state.lock().await.finish(claimed);
        if requeued {
            self.work_available.notify_one();
        }
        self.finished_available.notify_one();
    }

    /// Drain and return the finished lane as a batch, oldest first.
    pub async fn drain_finished(&self) -> Vec<Task> {
        self.state.lock().await.drain_finished()
    }

    /// Block until new work may be available, or the timeout elapses.
    pub async fn wait_for_work(&self, timeout: Duration) {
        let _ = tokio::time::timeout(timeout, self.work_available.notified()).await;
    }

    /// Block until a task may have finished, or the timeout elapses. Returns
    /// false on timeout.
    pub async fn wait_for_finished(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.finished_available.notified())
            .await
            .is_ok()
    }

    pub async fn register_worker(&self) {
        self.state.lock().await.register_worker();
    }

    /// Deregister a stopping worker and wake everyone still waiting, so the
    /// remaining workers re-check their stop flag.
    pub async fn deregister_worker(&self) {
        self.state.lock().await.deregister_worker();
        self.work_available.notify_waiters();
    }

    pub async fn worker_count(&self) -> usize {
        self.state.lock().await.workers()
    }

    /// Best-effort lane snapshot.
    pub async fn depths(&self) -> QueueDepths {
        self.state.lock().await.depths()
    }
}
