//! Pipeline step descriptions.
//!
//! A step names a registered evaluator kind and carries opaque parameters;
//! the registry decides what the parameters mean. What happens when a step
//! rejects its input is part of the step description too ([`OnFail`]), so the
//! executor never needs step-specific failure knowledge.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Value;

/// Registry key of a step evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepKind(String);

impl StepKind {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Action taken when a step rejects its input.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum OnFail {
    /// Fail the pipeline with the step's error message.
    #[default]
    Report,

    /// Discard the sample; the pipeline ends with a no-value result.
    Discard,

    /// Substitute a value and continue with the remaining steps.
    SetValue(Value),

    /// Fail the pipeline with a custom error message.
    SetError(String),
}

/// One transformation step of a preprocessing pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub kind: StepKind,

    /// Evaluator-specific parameters, opaque to the scheduler.
    #[serde(default)]
    pub params: serde_json::Value,

    #[serde(default)]
    pub on_fail: OnFail,
}

impl Step {
    pub fn new(kind: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            kind: StepKind::new(kind),
            params,
            on_fail: OnFail::Report,
        }
    }

    pub fn with_on_fail(mut self, on_fail: OnFail) -> Self {
        self.on_fail = on_fail;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_on_fail_is_report() {
        let step = Step::new("scale", serde_json::json!({"factor": 10}));
        assert_eq!(step.on_fail, OnFail::Report);
    }

    #[test]
    fn step_roundtrips_serde() {
        let step = Step::new("deadband", serde_json::json!({"threshold": 0.5}))
            .with_on_fail(OnFail::SetValue(Value::UInt(0)));

        let s = serde_json::to_string(&step).unwrap();
        let back: Step = serde_json::from_str(&s).unwrap();
        assert_eq!(back, step);
    }
}
