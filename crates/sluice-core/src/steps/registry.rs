//! Step evaluator registry.
//!
//! Design:
//! - Built during initialization (mutable).
//! - Used during runtime (immutable, shared behind `Arc`).
//! This keeps lookups lock-free on the hot path.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{Sample, StepKind};
use crate::error::SluiceError;

/// What a step evaluator produced.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutput {
    /// A new sample for the next step.
    Next(Sample),

    /// Drop the sample; the pipeline ends with a no-value result.
    Discard,
}

/// An evaluator for one step kind.
///
/// Evaluators are pure: a function of (sample, params) with no side effects
/// outside the returned value. Errors are plain messages; the executor turns
/// them into structured pipeline failures.
pub trait StepHandler: Send + Sync {
    fn apply(&self, sample: Sample, params: &serde_json::Value) -> Result<StepOutput, String>;
}

/// Registry of step evaluators (step kind -> handler).
#[derive(Default)]
pub struct StepRegistry {
    handlers: HashMap<StepKind, Arc<dyn StepHandler>>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register an evaluator for a step kind.
    pub fn register(
        &mut self,
        kind: StepKind,
        handler: Arc<dyn StepHandler>,
    ) -> Result<(), SluiceError> {
        if self.handlers.contains_key(&kind) {
            return Err(SluiceError::DuplicateStep(kind));
        }
        self.handlers.insert(kind, handler);
        Ok(())
    }

    pub fn get(&self, kind: &StepKind) -> Option<&Arc<dyn StepHandler>> {
        self.handlers.get(kind)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
