//! Configuration types.

use crate::error::SluiceError;

/// Scheduler configuration.
///
/// The worker count is fixed at startup; there is no resizing and no
/// work-stealing, all workers share the one queue.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Number of preprocessing workers.
    pub workers: usize,
    /// Maximum number of items kept in the value cache.
    pub cache_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: 3,
            cache_capacity: 1024,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), SluiceError> {
        if self.workers == 0 {
            return Err(SluiceError::InvalidConfig(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.cache_capacity == 0 {
            return Err(SluiceError::InvalidConfig(
                "cache_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
