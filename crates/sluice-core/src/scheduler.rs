//! Scheduler facade: the in-process API the external supervisor drives.
//!
//! The supervisor constructs tasks, hands them over with [`Scheduler::enqueue`],
//! and harvests completed tasks with [`Scheduler::fetch_finished`]. Follow-up
//! scheduling (e.g. creating dependent tasks once a primary item finishes) is
//! the supervisor's job; the scheduler does not know the item graph.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::cache::ValueCache;
use crate::config::SchedulerConfig;
use crate::domain::Task;
use crate::error::SluiceError;
use crate::observability::QueueDepths;
use crate::queue::TaskQueue;
use crate::steps::StepRegistry;
use crate::timekeeper::Timekeeper;
use crate::worker::WorkerGroup;

pub struct Scheduler {
    queue: Arc<TaskQueue>,
    cache: Arc<ValueCache>,
    workers: WorkerGroup,
}

impl Scheduler {
    /// Validate the configuration, build the queue and cache, and spawn the
    /// worker pool. Must be called from within a tokio runtime.
    pub fn start(
        config: SchedulerConfig,
        registry: Arc<StepRegistry>,
        timekeeper: Arc<dyn Timekeeper>,
    ) -> Result<Self, SluiceError> {
        config.validate()?;

        let queue = Arc::new(TaskQueue::new());
        let cache = Arc::new(ValueCache::new(config.cache_capacity));
        let workers = WorkerGroup::spawn(config.workers, Arc::clone(&queue), registry, timekeeper);

        info!(workers = workers.size(), "preprocessing scheduler started");

        Ok(Self {
            queue,
            cache,
            workers,
        })
    }

    /// The shared value cache, for the supervisor to hang onto tasks that
    /// should participate in dependent fanout. Cache use is opt-in per task.
    pub fn cache(&self) -> Arc<ValueCache> {
        Arc::clone(&self.cache)
    }

    /// Hand a task over; ownership transfers to the queue.
    pub async fn enqueue(&self, task: Task) {
        self.queue.enqueue(task).await;
    }

    /// Drain and return completed tasks; ownership returns to the caller.
    pub async fn fetch_finished(&self) -> Vec<Task> {
        self.queue.drain_finished().await
    }

    /// Wait until a task may have finished, or the timeout elapses. Returns
    /// false on timeout.
    pub async fn wait_finished(&self, timeout: Duration) -> bool {
        self.queue.wait_for_finished(timeout).await
    }

    pub async fn pending_depth(&self) -> usize {
        self.queue.depths().await.pending
    }

    pub async fn in_progress_count(&self) -> usize {
        self.queue.depths().await.in_progress
    }

    pub async fn depths(&self) -> QueueDepths {
        self.queue.depths().await
    }

    pub fn worker_count(&self) -> usize {
        self.workers.size()
    }

    /// Stop all workers, wait for them to exit, and return whatever finished
    /// tasks were still unharvested so nothing is dropped.
    pub async fn shutdown(self) -> Vec<Task> {
        self.workers.shutdown_and_join().await;
        info!("preprocessing scheduler stopped");
        self.queue.drain_finished().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ItemId, Primary, Sample, Value};
    use crate::timekeeper::NullTimekeeper;

    fn start(workers: usize) -> Scheduler {
        Scheduler::start(
            SchedulerConfig {
                workers,
                cache_capacity: 64,
            },
            Arc::new(StepRegistry::new()),
            Arc::new(NullTimekeeper),
        )
        .unwrap()
    }

    async fn harvest(scheduler: &Scheduler, want: usize) -> Vec<Task> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        let mut out = Vec::new();

        while out.len() < want && tokio::time::Instant::now() < deadline {
            out.extend(scheduler.fetch_finished().await);
            if out.len() < want {
                scheduler.wait_finished(Duration::from_millis(50)).await;
            }
        }
        out
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn invalid_config_is_rejected() {
        let result = Scheduler::start(
            SchedulerConfig {
                workers: 0,
                cache_capacity: 64,
            },
            Arc::new(StepRegistry::new()),
            Arc::new(NullTimekeeper),
        );
        assert!(result.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn enqueue_harvest_shutdown_lifecycle() {
        let scheduler = start(2);

        for i in 0..5u64 {
            scheduler
                .enqueue(Task::value(
                    ItemId::new(i),
                    Vec::new(),
                    Sample::now(Value::UInt(i)),
                    None,
                ))
                .await;
        }

        let finished = harvest(&scheduler, 5).await;
        assert_eq!(finished.len(), 5);

        let depths = scheduler.depths().await;
        assert_eq!(depths.total(), 0);

        let leftovers = scheduler.shutdown().await;
        assert!(leftovers.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn dependent_fanout_populates_both_cache_entries() {
        let scheduler = start(2);
        let cache = scheduler.cache();

        let master = ItemId::new(7);
        let derived = ItemId::new(8);
        let input = Sample::now(Value::Float(3.14));

        // Primary value task for the master item.
        scheduler
            .enqueue(Task::value(
                master,
                Vec::new(),
                input.clone(),
                Some(Arc::clone(&cache)),
            ))
            .await;

        let finished = harvest(&scheduler, 1).await;
        assert_eq!(finished.len(), 1);
        assert!(finished[0].result().unwrap().is_ok());

        // The supervisor reacts to the master's completion by scheduling the
        // dependent derivation against the primary's materialized pipeline.
        let primary = Arc::new(Primary {
            item_id: master,
            steps: Vec::new(),
            input,
        });
        scheduler
            .enqueue(Task::dependent(derived, primary, Some(Arc::clone(&cache))))
            .await;

        let finished = harvest(&scheduler, 1).await;
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].item_id, derived);
        assert_eq!(
            finished[0].result().unwrap().sample.value,
            Value::Float(3.14)
        );

        assert_eq!(cache.get(master).unwrap().value, Value::Float(3.14));
        assert_eq!(cache.get(derived).unwrap().value, Value::Float(3.14));

        scheduler.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_task_records_per_step_history() {
        use crate::domain::{Step, StepKind, TaskKind};
        use crate::steps::{StepHandler, StepOutput};

        struct Increment;

        impl StepHandler for Increment {
            fn apply(
                &self,
                sample: Sample,
                _params: &serde_json::Value,
            ) -> Result<StepOutput, String> {
                match sample.value {
                    Value::UInt(v) => {
                        Ok(StepOutput::Next(Sample::new(Value::UInt(v + 1), sample.ts)))
                    }
                    other => Err(format!("cannot increment {}", other.type_name())),
                }
            }
        }

        let registry = {
            let mut reg = StepRegistry::new();
            reg.register(StepKind::new("increment"), Arc::new(Increment))
                .unwrap();
            Arc::new(reg)
        };
        let scheduler = Scheduler::start(
            SchedulerConfig {
                workers: 1,
                cache_capacity: 64,
            },
            registry,
            Arc::new(NullTimekeeper),
        )
        .unwrap();

        let steps: Vec<Step> = (0..4)
            .map(|_| Step::new("increment", serde_json::Value::Null))
            .collect();
        scheduler
            .enqueue(Task::test(
                ItemId::new(1),
                steps,
                Sample::now(Value::UInt(0)),
            ))
            .await;

        let finished = harvest(&scheduler, 1).await;
        assert_eq!(finished.len(), 1);

        match &finished[0].kind {
            TaskKind::Test(t) => {
                assert_eq!(t.history.len(), 4);
                for (i, record) in t.history.iter().enumerate() {
                    assert_eq!(record.sample.value, Value::UInt(i as u64 + 1));
                }
                assert_eq!(
                    t.result.as_ref().unwrap().sample.value,
                    Value::UInt(4),
                    "final result matches the last recorded step"
                );
            }
            other => panic!("unexpected kind {}", other.name()),
        }

        scheduler.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn shutdown_returns_unharvested_tasks() {
        let scheduler = start(2);

        for i in 0..3u64 {
            scheduler
                .enqueue(Task::value(
                    ItemId::new(i),
                    Vec::new(),
                    Sample::now(Value::UInt(i)),
                    None,
                ))
                .await;
        }

        // Give the workers time to finish, but never fetch.
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while scheduler.depths().await.finished < 3 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let leftovers = scheduler.shutdown().await;
        assert_eq!(leftovers.len(), 3);
    }
}
