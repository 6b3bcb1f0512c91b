//! Preprocessing task records.
//!
//! A task is a header (task id + item id) plus a kind-specific payload. The
//! payloads share the value/result substructures; ownership of the whole
//! record moves with it through the queue lanes.
//!
//! Ordered execution is requested with [`TaskKind::ValueSeq`]; the queue
//! collapses all ordered tasks of one item into a single internal scheduling
//! token, so a sequence never appears here.

use std::sync::Arc;

use crate::cache::ValueCache;

use super::{ExecResult, ItemId, Sample, Step, StepRecord, TaskId};

/// Payload of a pipeline-testing task.
///
/// Testing flows want the intermediate state after every step, so the worker
/// fills `history` alongside the final result. Test tasks never touch the
/// value cache.
#[derive(Debug)]
pub struct TestTask {
    pub steps: Vec<Step>,
    pub input: Sample,
    pub result: Option<ExecResult>,
    pub history: Vec<StepRecord>,
}

/// Payload of a value task (plain or ordered).
#[derive(Debug)]
pub struct ValueTask {
    pub steps: Vec<Step>,
    pub input: Sample,
    pub cache: Option<Arc<ValueCache>>,
    pub result: Option<ExecResult>,
}

/// Materialized pipeline of a primary task, shared by its dependents.
///
/// A dependent runs the primary's steps on the primary's input; only the
/// cache write uses the dependent's own item id.
#[derive(Debug)]
pub struct Primary {
    pub item_id: ItemId,
    pub steps: Vec<Step>,
    pub input: Sample,
}

/// Payload of a dependent-derivation task.
#[derive(Debug)]
pub struct DependentTask {
    pub primary: Arc<Primary>,
    pub cache: Option<Arc<ValueCache>>,
    pub result: Option<ExecResult>,
}

/// Kind-specific task payload.
#[derive(Debug)]
pub enum TaskKind {
    /// One-shot pipeline test with per-step bookkeeping.
    Test(TestTask),

    /// Independent value task; may execute in parallel with anything.
    Value(ValueTask),

    /// Value task belonging to an ordered per-item stream.
    ValueSeq(ValueTask),

    /// Derivation fed by a primary task's pipeline.
    Dependent(DependentTask),
}

impl TaskKind {
    /// Short name of the variant, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::Test(_) => "test",
            TaskKind::Value(_) => "value",
            TaskKind::ValueSeq(_) => "value_seq",
            TaskKind::Dependent(_) => "dependent",
        }
    }
}

/// A preprocessing task: shared header plus payload.
#[derive(Debug)]
pub struct Task {
    pub id: TaskId,
    pub item_id: ItemId,
    pub kind: TaskKind,
}

impl Task {
    pub fn test(item_id: ItemId, steps: Vec<Step>, input: Sample) -> Self {
        Self {
            id: TaskId::new(),
            item_id,
            kind: TaskKind::Test(TestTask {
                steps,
                input,
                result: None,
                history: Vec::new(),
            }),
        }
    }

    pub fn value(
        item_id: ItemId,
        steps: Vec<Step>,
        input: Sample,
        cache: Option<Arc<ValueCache>>,
    ) -> Self {
        Self {
            id: TaskId::new(),
            item_id,
            kind: TaskKind::Value(ValueTask {
                steps,
                input,
                cache,
                result: None,
            }),
        }
    }

    /// An ordered value task: all `value_seq` tasks of one item execute in
    /// submission order, at most one in flight.
    pub fn value_seq(
        item_id: ItemId,
        steps: Vec<Step>,
        input: Sample,
        cache: Option<Arc<ValueCache>>,
    ) -> Self {
        Self {
            id: TaskId::new(),
            item_id,
            kind: TaskKind::ValueSeq(ValueTask {
                steps,
                input,
                cache,
                result: None,
            }),
        }
    }

    pub fn dependent(
        item_id: ItemId,
        primary: Arc<Primary>,
        cache: Option<Arc<ValueCache>>,
    ) -> Self {
        Self {
            id: TaskId::new(),
            item_id,
            kind: TaskKind::Dependent(DependentTask {
                primary,
                cache,
                result: None,
            }),
        }
    }

    /// True for tasks that must honor the per-item serialization rule.
    pub fn is_ordered(&self) -> bool {
        matches!(self.kind, TaskKind::ValueSeq(_))
    }

    /// The pipeline result, once a worker has filled it in.
    pub fn result(&self) -> Option<&ExecResult> {
        match &self.kind {
            TaskKind::Test(t) => t.result.as_ref(),
            TaskKind::Value(t) | TaskKind::ValueSeq(t) => t.result.as_ref(),
            TaskKind::Dependent(t) => t.result.as_ref(),
        }
    }

    /// Store a result, used by workers and by panic cleanup.
    pub(crate) fn set_result(&mut self, result: ExecResult) {
        match &mut self.kind {
            TaskKind::Test(t) => t.result = Some(result),
            TaskKind::Value(t) | TaskKind::ValueSeq(t) => t.result = Some(result),
            TaskKind::Dependent(t) => t.result = Some(result),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Value;

    fn sample() -> Sample {
        Sample::now(Value::UInt(1))
    }

    #[test]
    fn tasks_get_distinct_ids() {
        let a = Task::value(ItemId::new(1), Vec::new(), sample(), None);
        let b = Task::value(ItemId::new(1), Vec::new(), sample(), None);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn only_value_seq_is_ordered() {
        let item = ItemId::new(7);
        assert!(Task::value_seq(item, Vec::new(), sample(), None).is_ordered());
        assert!(!Task::value(item, Vec::new(), sample(), None).is_ordered());
        assert!(!Task::test(item, Vec::new(), sample()).is_ordered());
    }

    #[test]
    fn dependent_carries_primary_pipeline() {
        let primary = Arc::new(Primary {
            item_id: ItemId::new(7),
            steps: vec![Step::new("scale", serde_json::json!({"factor": 2}))],
            input: sample(),
        });

        let task = Task::dependent(ItemId::new(8), Arc::clone(&primary), None);
        assert_eq!(task.item_id, ItemId::new(8));
        match &task.kind {
            TaskKind::Dependent(d) => assert_eq!(d.primary.item_id, ItemId::new(7)),
            other => panic!("unexpected kind {}", other.name()),
        }
    }

    #[test]
    fn result_slot_starts_empty() {
        let mut task = Task::value(ItemId::new(1), Vec::new(), sample(), None);
        assert!(task.result().is_none());

        task.set_result(ExecResult::success(sample()));
        assert!(task.result().is_some_and(ExecResult::is_ok));
    }
}
