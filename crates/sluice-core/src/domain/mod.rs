//! Domain model (ids, values, steps, results, tasks).
pub mod ids;
pub mod result;
pub mod step;
pub mod task;
pub mod value;

pub use ids::{ItemId, TaskId, WorkerId};
pub use result::{Disposition, ExecResult, StepRecord};
pub use step::{OnFail, Step, StepKind};
pub use task::{DependentTask, Primary, Task, TaskKind, TestTask, ValueTask};
pub use value::{LogValue, Sample, Value};
