//! Queue lane state.
//!
//! Everything here is mutated under the queue's one mutex; the methods are
//! synchronous so the lane logic stays testable without a runtime.
//!
//! Lanes:
//! - `pending` — FIFO of runnable entries: plain tasks, or scheduling tokens
//!   for ordered per-item streams.
//! - `in_progress` — ids of tasks currently held by workers (the records
//!   themselves are physically owned by the worker while running).
//! - `finished` — FIFO awaiting supervisor harvest.
//! - `sequences` — per-item FIFOs of ordered sub-tasks. An entry exists
//!   exactly while its item has a scheduling token in pending or in flight,
//!   which is what guarantees at most one ordered task per item running.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::domain::{ItemId, Task, TaskId};
use crate::observability::QueueDepths;

/// One runnable entry of the pending lane.
#[derive(Debug)]
pub(crate) enum PendingEntry {
    /// An independent task, runnable as-is.
    Task(Task),

    /// Scheduling token of an ordered stream; the work itself is the head of
    /// the item's sequence FIFO.
    SequenceToken(ItemId),
}

/// A unit of work held by a worker between `claim` and `finish`.
///
/// For ordered streams this is the head sub-task claimed through the item's
/// scheduling token; finishing it decides whether the token requeues.
#[derive(Debug)]
pub struct Claimed {
    task: Task,
    from_sequence: bool,
}

impl Claimed {
    fn new(task: Task, from_sequence: bool) -> Self {
        Self {
            task,
            from_sequence,
        }
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn task_mut(&mut self) -> &mut Task {
        &mut self.task
    }

    pub(crate) fn into_parts(self) -> (Task, bool) {
        (self.task, self.from_sequence)
    }
}

#[derive(Debug, Default)]
pub(crate) struct QueueState {
    pending: VecDeque<PendingEntry>,
    in_progress: HashSet<TaskId>,
    finished: VecDeque<Task>,
    sequences: HashMap<ItemId, VecDeque<Task>>,
    workers: usize,
}

impl QueueState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Accept a task. Returns true when new runnable work surfaced (the
    /// caller signals the work notify only then).
    pub(crate) fn enqueue(&mut self, task: Task) -> bool {
        if !task.is_ordered() {
            self.pending.push_back(PendingEntry::Task(task));
            return true;
        }

        let item = task.item_id;
        match self.sequences.get_mut(&item) {
            Some(fifo) => {
                // A token for this item is already pending or in flight; the
                // sub-task just queues up behind it. No new runnable work.
                fifo.push_back(task);
                false
            }
            None => {
                self.sequences.insert(item, VecDeque::from([task]));
                self.pending.push_back(PendingEntry::SequenceToken(item));
                true
            }
        }
    }

    /// Pop the next runnable unit, or `None` when pending is empty.
    pub(crate) fn claim(&mut self) -> Option<Claimed> {
        match self.pending.pop_front()? {
            PendingEntry::Task(task) => {
                self.in_progress.insert(task.id);
                Some(Claimed::new(task, false))
            }
            PendingEntry::SequenceToken(item) => {
                let fifo = self
                    .sequences
                    .get_mut(&item)
                    .expect("sequence token without a sequence entry");
                let task = fifo
                    .pop_front()
                    .expect("scheduled sequence has no sub-tasks");
                self.in_progress.insert(task.id);
                Some(Claimed::new(task, true))
            }
        }
    }

    /// Return an executed unit. The task always lands on finished under its
    /// own identity; an ordered stream's token requeues while its FIFO still
    /// holds sub-tasks. Returns true when the token requeued.
    pub(crate) fn finish(&mut self, claimed: Claimed) -> bool {
        let (task, from_sequence) = claimed.into_parts();
        self.in_progress.remove(&task.id);

        let mut requeued = false;
        if from_sequence {
            let item = task.item_id;
            let drained = self
                .sequences
                .get(&item)
                .expect("sequence entry missing for claimed ordered task")
                .is_empty();

            if drained {
                self.sequences.remove(&item);
            } else {
                self.pending.push_back(PendingEntry::SequenceToken(item));
                requeued = true;
            }
        }

        self.finished.push_back(task);
        requeued
    }

    pub(crate) fn drain_finished(&mut self) -> Vec<Task> {
        self.finished.drain(..).collect()
    }

    pub(crate) fn register_worker(&mut self) {
        self.workers += 1;
    }

    pub(crate) fn deregister_worker(&mut self) {
        self.workers -= 1;
    }

    pub(crate) fn workers(&self) -> usize {
        self.workers
    }

    pub(crate) fn depths(&self) -> QueueDepths {
        let plain = self
            .pending
            .iter()
            .filter(|entry| matches!(entry, PendingEntry::Task(_)))
            .count();
        let parked: usize = self.sequences.values().map(VecDeque::len).sum();

        QueueDepths {
            pending: plain + parked,
            in_progress: self.in_progress.len(),
            finished: self.finished.len(),
        }
    }
}
