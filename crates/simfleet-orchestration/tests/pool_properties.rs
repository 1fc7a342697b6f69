//! Property tests for the pool driver's dispatch protocol.

use std::sync::atomic::{AtomicUsize, Ordering};

use proptest::prelude::*;

use simfleet_core::job::{Job, JobId, ParameterSet};
use simfleet_core::SimError;
use simfleet_orchestration::{JobRunner, NullProgressReporter, PoolConfig, Slot, SlotState, WorkerPool};

/// Returns the id it was given; fails every job whose id is a multiple of
/// `fail_every` (when non-zero).
struct IdRunner {
    fail_every: u64,
    runs: AtomicUsize,
}

impl JobRunner for IdRunner {
    type Output = u64;

    fn run(&self, _slot: &Slot, job: &Job) -> Result<u64, SimError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if self.fail_every > 0 && job.id.0 % self.fail_every == 0 {
            return Err(SimError::Config("rejected".into()));
        }
        Ok(job.id.0)
    }
}

fn pool(slots: usize) -> WorkerPool {
    let config = PoolConfig {
        max_slots: 8,
        ..PoolConfig::default()
    };
    WorkerPool::new(config, slots).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_job_is_accounted_for_exactly_once(
        jobs in 0u64..40,
        slots in 1usize..=8,
        fail_every in 0u64..5,
    ) {
        let runner = IdRunner { fail_every, runs: AtomicUsize::new(0) };
        let pool = pool(slots);
        let batch: Vec<Job> = (0..jobs).map(|i| Job::new(i, ParameterSet::new())).collect();

        let report = pool.run_batch(&runner, batch, &NullProgressReporter).unwrap();

        prop_assert_eq!(runner.runs.load(Ordering::SeqCst) as u64, jobs);
        prop_assert_eq!((report.results.len() + report.failures.len()) as u64, jobs);
        prop_assert!(report.missing.is_empty());
        for id in 0..jobs {
            let id = JobId(id);
            prop_assert!(report.results.contains_key(&id) != report.failures.contains_key(&id));
        }
        for (id, result) in &report.results {
            prop_assert_eq!(result.output, id.0);
        }
        prop_assert!(pool.slot_states().iter().all(|s| *s == SlotState::Terminated));
    }
}
