//! sluice-core
//!
//! Preprocessing task scheduler for monitored metric values: a pool of
//! workers drains one shared queue, runs user-defined transformation
//! pipelines over incoming samples, and preserves per-item ordering where
//! downstream derivations need it.
//!
//! Module map:
//! - domain: ids, values, steps, results, task records
//! - queue: the four-lane shared task queue
//! - worker: the worker pool
//! - steps: step evaluator registry + pipeline executor
//! - cache: last processed sample per item, for dependent fanout
//! - scheduler: the facade the external supervisor drives
//! - timekeeper: busy/idle reporting collaborator
//! - observability: lane depth snapshots

pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod observability;
pub mod queue;
pub mod scheduler;
pub mod steps;
pub mod timekeeper;
pub mod worker;
