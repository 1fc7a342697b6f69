//! Job-timing sampler.
//!
//! Runs a random sample of a batch through the pool to estimate how long a
//! full batch will take before committing a node to it.

use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use rand::Rng;

use simfleet_core::job::Job;
use simfleet_core::SimError;

use crate::interfaces::{JobRunner, ProgressReporter};
use crate::pool::WorkerPool;

/// Run `sample_size` jobs drawn without replacement from `jobs` and return
/// the mean wall time per job.
///
/// The sample is capped at the number of jobs available. Jobs that fail still
/// count towards the elapsed time.
pub fn time_jobs<R: JobRunner, G: Rng + ?Sized>(
    pool: &WorkerPool,
    runner: &R,
    jobs: &[Job],
    sample_size: usize,
    rng: &mut G,
    reporter: &dyn ProgressReporter,
) -> Result<Duration, SimError> {
    let take = sample_size.min(jobs.len());
    if take == 0 {
        return Err(SimError::Config(
            "timing sample is empty; need at least one job".into(),
        ));
    }

    let sample: Vec<Job> = jobs.choose_multiple(rng, take).cloned().collect();
    tracing::info!(sample = take, slots = pool.slots().len(), "timing sample");

    let started = Instant::now();
    let report = pool.run_batch(runner, sample, reporter)?;
    let elapsed = started.elapsed();
    if !report.failures.is_empty() {
        tracing::warn!(failed = report.failures.len(), "some sampled jobs failed");
    }

    let per_job = elapsed / u32::try_from(take).unwrap_or(u32::MAX);
    tracing::info!(total = ?elapsed, per_job = ?per_job, "timing sample finished");
    Ok(per_job)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::thread;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use simfleet_core::job::{JobId, ParameterSet};

    use crate::config::PoolConfig;
    use crate::interfaces::NullProgressReporter;
    use crate::slot::Slot;

    struct SleepRunner {
        delay: Duration,
        seen: Mutex<Vec<JobId>>,
    }

    impl JobRunner for SleepRunner {
        type Output = ();

        fn run(&self, _slot: &Slot, job: &Job) -> Result<(), SimError> {
            self.seen.lock().unwrap().push(job.id);
            thread::sleep(self.delay);
            Ok(())
        }
    }

    fn runner(ms: u64) -> SleepRunner {
        SleepRunner {
            delay: Duration::from_millis(ms),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn jobs(n: u64) -> Vec<Job> {
        (0..n).map(|i| Job::new(i, ParameterSet::new())).collect()
    }

    #[test]
    fn samples_without_replacement() {
        let pool = WorkerPool::new(PoolConfig::default(), 2).unwrap();
        let runner = runner(0);
        let mut rng = StdRng::seed_from_u64(7);
        time_jobs(&pool, &runner, &jobs(20), 5, &mut rng, &NullProgressReporter).unwrap();

        let mut seen = runner.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 5);
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 5);
        assert!(seen.iter().all(|id| id.0 < 20));
    }

    #[test]
    fn sample_is_capped_at_available_jobs() {
        let pool = WorkerPool::new(PoolConfig::default(), 1).unwrap();
        let runner = runner(0);
        let mut rng = StdRng::seed_from_u64(1);
        time_jobs(&pool, &runner, &jobs(3), 10, &mut rng, &NullProgressReporter).unwrap();
        assert_eq!(runner.seen.lock().unwrap().len(), 3);
    }

    #[test]
    fn mean_reflects_run_time() {
        let pool = WorkerPool::new(PoolConfig::default(), 1).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let per_job =
            time_jobs(&pool, &runner(10), &jobs(4), 2, &mut rng, &NullProgressReporter).unwrap();
        assert!(per_job >= Duration::from_millis(10));
    }

    #[test]
    fn empty_sample_is_rejected() {
        let pool = WorkerPool::new(PoolConfig::default(), 1).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        for (jobs, size) in [(jobs(0), 3), (jobs(3), 0)] {
            assert!(matches!(
                time_jobs(&pool, &runner(0), &jobs, size, &mut rng, &NullProgressReporter),
                Err(SimError::Config(_))
            ));
        }
    }
}
