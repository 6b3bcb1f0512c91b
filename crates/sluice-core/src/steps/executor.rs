//! Pipeline execution against the step registry.
//!
//! One [`ExecContext`] per worker; it is never shared. The executor walks a
//! task's step list, short-circuits on the first unhandled failure, and
//! writes the value cache only after the whole pipeline has succeeded.

use std::sync::Arc;

use tracing::trace;

use crate::cache::ValueCache;
use crate::domain::{ExecResult, ItemId, OnFail, Sample, Step, StepRecord};
use crate::error::SluiceError;
use crate::steps::registry::{StepOutput, StepRegistry};

/// Per-worker execution context: registry handle plus reusable step-history
/// scratch for testing flows.
pub struct ExecContext {
    registry: Arc<StepRegistry>,
    scratch: Vec<StepRecord>,
}

/// Internal outcome of one step application after the failure action ran.
enum StepVerdict {
    Continue(Sample),
    Discard,
    Fail(String),
}

impl ExecContext {
    pub fn new(registry: Arc<StepRegistry>) -> Self {
        Self {
            registry,
            scratch: Vec::new(),
        }
    }

    /// Run `steps` over `input`, writing `cache` under `item` on success.
    ///
    /// Used for value, ordered-value, and dependent tasks. Dependent callers
    /// pass the primary's steps and input with the dependent's own item id.
    pub fn execute(
        &mut self,
        item: ItemId,
        steps: &[Step],
        input: &Sample,
        cache: Option<&ValueCache>,
    ) -> ExecResult {
        self.run(item, steps, input, cache, false).0
    }

    /// Run `steps` over `input`, recording the intermediate sample after
    /// every executed step. Testing flows never supply a cache.
    pub fn execute_traced(
        &mut self,
        item: ItemId,
        steps: &[Step],
        input: &Sample,
    ) -> (ExecResult, Vec<StepRecord>) {
        let (result, history) = self.run(item, steps, input, None, true);
        (result, history)
    }

    fn run(
        &mut self,
        item: ItemId,
        steps: &[Step],
        input: &Sample,
        cache: Option<&ValueCache>,
        traced: bool,
    ) -> (ExecResult, Vec<StepRecord>) {
        self.scratch.clear();
        let mut current = input.clone();

        for (index, step) in steps.iter().enumerate() {
            let verdict = self.apply_step(index, step, current.clone());

            match verdict {
                StepVerdict::Continue(next) => {
                    if traced {
                        self.scratch.push(StepRecord {
                            sample: next.clone(),
                            error: None,
                        });
                    }
                    current = next;
                }
                StepVerdict::Discard => {
                    trace!(item = %item, step = index + 1, "sample discarded");
                    if traced {
                        self.scratch.push(StepRecord {
                            sample: Sample::new(crate::domain::Value::None, current.ts),
                            error: None,
                        });
                    }
                    return (ExecResult::discarded(current.ts), self.take_history());
                }
                StepVerdict::Fail(message) => {
                    trace!(item = %item, step = index + 1, error = %message, "pipeline failed");
                    if traced {
                        self.scratch.push(StepRecord {
                            sample: current.clone(),
                            error: Some(message.clone()),
                        });
                    }
                    return (ExecResult::failure(message, current.ts), self.take_history());
                }
            }
        }

        if let Some(cache) = cache {
            cache.put(item, current.clone());
        }

        (ExecResult::success(current), self.take_history())
    }

    /// Apply one step, then its failure action if the evaluator rejected the
    /// sample.
    fn apply_step(&self, index: usize, step: &Step, sample: Sample) -> StepVerdict {
        let ts = sample.ts;

        let Some(handler) = self.registry.get(&step.kind) else {
            let err = SluiceError::UnknownStep(step.kind.clone());
            return StepVerdict::Fail(format!("step {}: {err}", index + 1));
        };

        match handler.apply(sample, &step.params) {
            Ok(StepOutput::Next(next)) => StepVerdict::Continue(next),
            Ok(StepOutput::Discard) => StepVerdict::Discard,
            Err(message) => match &step.on_fail {
                OnFail::Report => StepVerdict::Fail(format!(
                    "step {} ({}) failed: {message}",
                    index + 1,
                    step.kind
                )),
                OnFail::Discard => StepVerdict::Discard,
                OnFail::SetValue(value) => StepVerdict::Continue(Sample::new(value.clone(), ts)),
                OnFail::SetError(custom) => StepVerdict::Fail(custom.clone()),
            },
        }
    }

    fn take_history(&mut self) -> Vec<StepRecord> {
        std::mem::take(&mut self.scratch)
    }
}
