//! Orchestration interfaces.

use std::time::Duration;

use simfleet_core::job::Job;
use simfleet_core::progress::ProgressUpdate;
use simfleet_core::SimError;

use crate::pool::BatchSummary;
use crate::slot::Slot;

/// Runs one job to completion inside one slot.
///
/// Called from the slot's worker thread; implementations may block for as
/// long as the external tool takes.
pub trait JobRunner: Send + Sync {
    /// Payload produced by a successful run.
    type Output: Send + 'static;

    fn run(&self, slot: &Slot, job: &Job) -> Result<Self::Output, SimError>;
}

/// Trait for reporting batch progress to the user.
pub trait ProgressReporter: Send + Sync {
    /// Report one finished job.
    fn report(&self, update: &ProgressUpdate);

    /// Report batch completion.
    fn complete(&self);
}

/// Trait for presenting batch outcomes to the user.
pub trait ResultPresenter: Send + Sync {
    /// Present one finished batch. `label` identifies the batch (usually
    /// the output file it was written to).
    fn present_batch(&self, label: &str, summary: &BatchSummary);

    /// Present a timing estimate: mean time per job over `sampled` jobs and
    /// the projected wall time for `jobs` jobs across `slots` slots.
    fn present_timing(&self, per_job: Duration, sampled: usize, jobs: usize, slots: usize);

    /// Present an error.
    fn present_error(&self, error: &str);
}

/// Null progress reporter (does nothing).
pub struct NullProgressReporter;

impl ProgressReporter for NullProgressReporter {
    fn report(&self, _update: &ProgressUpdate) {}
    fn complete(&self) {}
}
