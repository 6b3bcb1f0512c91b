//! Worker busy/idle accounting.
//!
//! The timekeeper is an external collaborator: the pool reports every
//! busy/idle transition with a wall-clock stamp and worker id, and the
//! collaborator decides what to keep. [`UsageLedger`] is the in-process
//! implementation used by the demo and the tests; [`NullTimekeeper`] drops
//! everything.

use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Mutex;

use crate::domain::WorkerId;

/// Receives per-worker busy/idle transitions.
pub trait Timekeeper: Send + Sync {
    fn mark_busy(&self, worker: WorkerId, at: DateTime<Utc>);
    fn mark_idle(&self, worker: WorkerId, at: DateTime<Utc>);
}

/// A timekeeper that records nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTimekeeper;

impl Timekeeper for NullTimekeeper {
    fn mark_busy(&self, _worker: WorkerId, _at: DateTime<Utc>) {}
    fn mark_idle(&self, _worker: WorkerId, _at: DateTime<Utc>) {}
}

#[derive(Debug, Clone)]
struct Slot {
    busy_since: Option<DateTime<Utc>>,
    busy_total: TimeDelta,
    transitions: u64,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            busy_since: None,
            busy_total: TimeDelta::zero(),
            transitions: 0,
        }
    }
}

/// Accumulates busy time and transition counts per worker.
///
/// Worker ids are 1-based; slot `id - 1` belongs to worker `id`.
#[derive(Debug)]
pub struct UsageLedger {
    slots: Vec<Mutex<Slot>>,
}

impl UsageLedger {
    /// A ledger for `workers` workers.
    pub fn new(workers: usize) -> Self {
        Self {
            slots: (0..workers).map(|_| Mutex::new(Slot::default())).collect(),
        }
    }

    fn slot(&self, worker: WorkerId) -> &Mutex<Slot> {
        &self.slots[worker.slot()]
    }

    /// Total busy time recorded for a worker so far.
    pub fn busy_time(&self, worker: WorkerId) -> TimeDelta {
        self.slot(worker)
            .lock()
            .expect("usage ledger mutex poisoned")
            .busy_total
    }

    /// Number of busy/idle transitions recorded for a worker.
    pub fn transitions(&self, worker: WorkerId) -> u64 {
        self.slot(worker)
            .lock()
            .expect("usage ledger mutex poisoned")
            .transitions
    }
}

impl Timekeeper for UsageLedger {
    fn mark_busy(&self, worker: WorkerId, at: DateTime<Utc>) {
        let mut slot = self
            .slot(worker)
            .lock()
            .expect("usage ledger mutex poisoned");
        slot.busy_since = Some(at);
        slot.transitions += 1;
    }

    fn mark_idle(&self, worker: WorkerId, at: DateTime<Utc>) {
        let mut slot = self
            .slot(worker)
            .lock()
            .expect("usage ledger mutex poisoned");
        if let Some(since) = slot.busy_since.take() {
            slot.busy_total = slot.busy_total + (at - since);
        }
        slot.transitions += 1;
    }
}
