//! Domain identifiers (strongly-typed IDs).
//!
//! Item ids are assigned by the external monitoring configuration, so they
//! stay plain 64-bit values. Task ids are minted here at construction time
//! (ULID: sortable by creation, no coordination needed) so every task can be
//! tracked through the finished lane exactly once.

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Identifier of a monitored item (a configured data source).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for ItemId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a preprocessing task (one unit handed to the queue).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Ulid);

impl TaskId {
    /// Mint a fresh id.
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    pub fn as_ulid(self) -> Ulid {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Identifier of a worker in the pool.
///
/// Worker ids are 1-based so they map one-to-one onto timekeeper slots via
/// [`WorkerId::slot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(usize);

impl WorkerId {
    /// Create a worker id. `id` must be >= 1.
    pub fn new(id: usize) -> Self {
        assert!(id >= 1, "worker ids are 1-based");
        Self(id)
    }

    pub fn get(self) -> usize {
        self.0
    }

    /// 0-based slot index for per-worker arrays.
    pub fn slot(self) -> usize {
        self.0 - 1
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
