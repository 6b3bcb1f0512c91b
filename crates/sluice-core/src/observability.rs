use serde::{Deserialize, Serialize};

/// Best-effort snapshot of the queue lanes.
///
/// `pending` counts runnable tasks including sub-tasks parked behind an
/// in-flight ordered stream, so that at any instant
/// `pending + in_progress + finished` equals tasks enqueued minus tasks
/// drained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueDepths {
    pub pending: usize,
    pub in_progress: usize,
    pub finished: usize,
}

impl QueueDepths {
    /// Total tasks currently owned by the queue or a worker.
    pub fn total(&self) -> usize {
        self.pending + self.in_progress + self.finished
    }
}
