use thiserror::Error;

use crate::domain::StepKind;

#[derive(Debug, Error)]
pub enum SluiceError {
    #[error("duplicate handler for step kind={0}")]
    DuplicateStep(StepKind),

    #[error("no handler registered for step kind={0}")]
    UnknownStep(StepKind),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
