//! Post-pipeline results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Sample, Value};

/// How a pipeline disposed of its sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// The pipeline produced a value.
    Normal,

    /// The pipeline failed; the item is not supported until a good sample
    /// arrives.
    NotSupported,

    /// A step (or its failure action) discarded the sample.
    Discarded,
}

/// Result of running a preprocessing pipeline on one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecResult {
    pub sample: Sample,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub disposition: Disposition,
}

impl ExecResult {
    pub fn success(sample: Sample) -> Self {
        Self {
            sample,
            error: None,
            disposition: Disposition::Normal,
        }
    }

    pub fn discarded(ts: DateTime<Utc>) -> Self {
        Self {
            sample: Sample::new(Value::None, ts),
            error: None,
            disposition: Disposition::Discarded,
        }
    }

    pub fn failure(message: impl Into<String>, ts: DateTime<Utc>) -> Self {
        let message = message.into();
        Self {
            sample: Sample::new(Value::Error(message.clone()), ts),
            error: Some(message),
            disposition: Disposition::NotSupported,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.disposition == Disposition::Normal
    }
}

/// Intermediate state recorded after one step, for pipeline testing flows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub sample: Sample,

    /// Error raised by this step, if it was the one that failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
