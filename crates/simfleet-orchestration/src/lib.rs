//! # simfleet-orchestration
//!
//! Slot layout, the single-job worker, the worker pool driver, and the
//! job-timing sampler.

pub mod config;
pub mod interfaces;
pub mod pool;
pub mod slot;
pub mod timing;
pub mod worker;

pub use config::PoolConfig;
pub use interfaces::{JobRunner, NullProgressReporter, ProgressReporter, ResultPresenter};
pub use pool::{BatchReport, BatchSummary, JobResult, SlotState, WorkerPool};
pub use slot::Slot;
pub use timing::time_jobs;
pub use worker::SlotWorker;
