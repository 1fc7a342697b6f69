//! Worker pool driver.
//!
//! A pool owns N slots. For each batch it starts one worker thread per slot;
//! every worker pulls [`Dispatch`] items from a shared input queue and
//! pushes [`WorkerEvent`]s onto a shared output queue. The driver feeds the
//! input queue, drains the output queue, and ends the batch once every
//! worker has exited.
//!
//! The input queue is a rendezvous channel: a send completes only when some
//! worker is blocked waiting for input, i.e. when the queue is empty. Once
//! the jobs are exhausted the driver answers every waiting worker with the
//! [`Dispatch::Done`] sentinel, so it never hands out fewer sentinels than
//! there are workers still running.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Select, SendError, Sender};
use parking_lot::{Mutex, RwLock};

use simfleet_core::job::{Dispatch, Job, JobId};
use simfleet_core::progress::{JobOutcome, ProgressUpdate};
use simfleet_core::SimError;

use crate::config::PoolConfig;
use crate::interfaces::{JobRunner, ProgressReporter};
use crate::slot::Slot;

/// Lifecycle of one slot's worker within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Thread started, not yet waiting for input.
    Spawned,
    /// Blocked on the input queue.
    WaitingForInput,
    /// Running a job.
    Executing(JobId),
    /// Exited after a sentinel (or a closed queue).
    Terminated,
}

/// Result of one successfully completed job.
#[derive(Debug, Clone)]
pub struct JobResult<O> {
    pub id: JobId,
    pub slot: usize,
    pub output: O,
    pub elapsed: Duration,
}

/// Everything the driver learned about a batch.
#[derive(Debug)]
pub struct BatchReport<O> {
    /// Completed jobs keyed by id.
    pub results: BTreeMap<JobId, JobResult<O>>,
    /// Failed jobs keyed by id, with the rendered error.
    pub failures: BTreeMap<JobId, String>,
    /// Jobs that produced neither a result nor a failure.
    pub missing: Vec<JobId>,
    /// Jobs submitted.
    pub total: usize,
    pub elapsed: Duration,
}

impl<O> BatchReport<O> {
    /// Whether every submitted job produced a result.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.results.len() == self.total
    }

    /// Payload-free view of the report, for presentation.
    #[must_use]
    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            total: self.total,
            completed: self.results.len(),
            failures: self
                .failures
                .iter()
                .map(|(id, error)| (*id, error.clone()))
                .collect(),
            missing: self.missing.clone(),
            elapsed: self.elapsed,
        }
    }

    /// Drop the per-job bookkeeping and keep only the payloads.
    #[must_use]
    pub fn into_outputs(self) -> BTreeMap<JobId, O> {
        self.results
            .into_iter()
            .map(|(id, r)| (id, r.output))
            .collect()
    }
}

/// Counts and causes of a finished batch, without the payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub completed: usize,
    pub failures: Vec<(JobId, String)>,
    pub missing: Vec<JobId>,
    pub elapsed: Duration,
}

impl BatchSummary {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }
}

/// Message from a worker thread to the driver.
enum WorkerEvent<O> {
    Completed(JobResult<O>),
    Failed { id: JobId, slot: usize, error: String },
    Exited { slot: usize },
}

/// Fixed-size pool of slot-bound workers.
pub struct WorkerPool {
    config: PoolConfig,
    slots: Vec<Slot>,
    states: RwLock<Vec<SlotState>>,
    // Held for a whole batch: a slot's files belong to one worker at a time.
    running: Mutex<()>,
}

impl WorkerPool {
    /// Create a pool with `slots` workers. Fails if the count is zero or
    /// exceeds `config.max_slots`.
    pub fn new(config: PoolConfig, slots: usize) -> Result<Self, SimError> {
        config.validate(slots)?;
        let layout = (0..slots).map(|i| Slot::new(&config, i)).collect();
        Ok(Self {
            config,
            slots: layout,
            states: RwLock::new(vec![SlotState::Spawned; slots]),
            running: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Snapshot of every slot's worker state.
    #[must_use]
    pub fn slot_states(&self) -> Vec<SlotState> {
        self.states.read().clone()
    }

    fn set_state(&self, slot: usize, state: SlotState) {
        self.states.write()[slot] = state;
    }

    /// Run a batch of jobs to completion.
    ///
    /// Returns once every worker has exited. Job failures do not abort the
    /// batch; they are collected in [`BatchReport::failures`]. Batches on the
    /// same pool run one after another; a concurrent call blocks until the
    /// running batch finishes.
    pub fn run_batch<R: JobRunner>(
        &self,
        runner: &R,
        jobs: Vec<Job>,
        reporter: &dyn ProgressReporter,
    ) -> Result<BatchReport<R::Output>, SimError> {
        let submitted: BTreeSet<JobId> = jobs.iter().map(|j| j.id).collect();
        if submitted.len() != jobs.len() {
            return Err(SimError::Config("batch contains duplicate job ids".into()));
        }

        let _running = self.running.lock();
        let started = Instant::now();
        let total = jobs.len();
        tracing::info!(jobs = total, slots = self.slots.len(), "starting batch");

        let mut results = BTreeMap::new();
        let mut failures = BTreeMap::new();

        thread::scope(|scope| -> Result<(), SimError> {
            let (work_tx, work_rx) = crossbeam_channel::bounded::<Dispatch>(0);
            let (event_tx, event_rx) = crossbeam_channel::unbounded::<WorkerEvent<R::Output>>();

            let mut handles = Vec::with_capacity(self.slots.len());
            for slot in &self.slots {
                self.set_state(slot.index(), SlotState::Spawned);
                let work_rx = work_rx.clone();
                let events = event_tx.clone();
                let spawned = thread::Builder::new()
                    .name(format!("simfleet-slot-{}", slot.index()))
                    .spawn_scoped(scope, move || self.worker_loop(slot, runner, &work_rx, &events));
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(source) => {
                        // Dropping the sender on return releases the workers
                        // already started.
                        return Err(SimError::Spawn {
                            slot: slot.index(),
                            source,
                        });
                    }
                }
            }
            drop(work_rx);
            drop(event_tx);

            let mut drain = Drain {
                results: &mut results,
                failures: &mut failures,
                total,
                reporter,
            };
            let sentinels = feed_and_drain(&work_tx, &event_rx, jobs, self.slots.len(), &mut drain);
            drop(work_tx);

            for handle in handles {
                if handle.join().is_err() {
                    tracing::error!("worker thread panicked outside a job");
                }
            }
            for event in event_rx.try_iter() {
                drain.apply(event);
            }
            tracing::debug!(sentinels, "all workers exited");
            Ok(())
        })?;

        let settle = self.config.settle_delay();
        if !settle.is_zero() {
            thread::sleep(settle);
        }

        let missing: Vec<JobId> = submitted
            .iter()
            .filter(|id| !results.contains_key(*id) && !failures.contains_key(*id))
            .copied()
            .collect();
        if results.len() != submitted.len() {
            tracing::info!(
                completed = results.len(),
                failed = failures.len(),
                missing = missing.len(),
                "not all inputs produced outputs"
            );
        }
        reporter.complete();

        let report = BatchReport {
            results,
            failures,
            missing,
            total,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            completed = report.results.len(),
            total,
            elapsed = ?report.elapsed,
            "batch finished"
        );
        Ok(report)
    }

    /// Pull loop of one slot's worker.
    fn worker_loop<R: JobRunner>(
        &self,
        slot: &Slot,
        runner: &R,
        work_rx: &Receiver<Dispatch>,
        events: &Sender<WorkerEvent<R::Output>>,
    ) {
        let index = slot.index();
        let _exit = ExitNotice {
            pool: self,
            slot: index,
            events,
        };

        loop {
            self.set_state(index, SlotState::WaitingForInput);
            let job = match work_rx.recv() {
                Ok(Dispatch::Run(job)) => job,
                Ok(Dispatch::Done) | Err(_) => break,
            };
            self.set_state(index, SlotState::Executing(job.id));

            let started = Instant::now();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| runner.run(slot, &job)));
            let event = match outcome {
                Ok(Ok(output)) => WorkerEvent::Completed(JobResult {
                    id: job.id,
                    slot: index,
                    output,
                    elapsed: started.elapsed(),
                }),
                Ok(Err(error)) => {
                    tracing::debug!(slot = index, job = %job.id, %error, "job failed");
                    WorkerEvent::Failed {
                        id: job.id,
                        slot: index,
                        error: error.to_string(),
                    }
                }
                Err(_) => {
                    tracing::error!(slot = index, job = %job.id, "job panicked");
                    WorkerEvent::Failed {
                        id: job.id,
                        slot: index,
                        error: "job panicked".to_string(),
                    }
                }
            };
            if events.send(event).is_err() {
                break;
            }
        }
    }
}

/// Marks a worker terminated and tells the driver, however the loop ends.
struct ExitNotice<'a, O> {
    pool: &'a WorkerPool,
    slot: usize,
    events: &'a Sender<WorkerEvent<O>>,
}

impl<O> Drop for ExitNotice<'_, O> {
    fn drop(&mut self) {
        self.pool.set_state(self.slot, SlotState::Terminated);
        let _ = self.events.send(WorkerEvent::Exited { slot: self.slot });
    }
}

/// Driver-side accumulation of worker events.
struct Drain<'a, O> {
    results: &'a mut BTreeMap<JobId, JobResult<O>>,
    failures: &'a mut BTreeMap<JobId, String>,
    total: usize,
    reporter: &'a dyn ProgressReporter,
}

impl<O> Drain<'_, O> {
    /// Record one event. Returns the slot index for `Exited` events.
    fn apply(&mut self, event: WorkerEvent<O>) -> Option<usize> {
        let (id, slot, outcome) = match event {
            WorkerEvent::Completed(result) => {
                let (id, slot) = (result.id, result.slot);
                self.results.insert(id, result);
                (id, slot, JobOutcome::Completed)
            }
            WorkerEvent::Failed { id, slot, error } => {
                self.failures.insert(id, error.clone());
                (id, slot, JobOutcome::Failed(error))
            }
            WorkerEvent::Exited { slot } => return Some(slot),
        };
        self.reporter.report(&ProgressUpdate {
            id,
            slot,
            done: self.results.len() + self.failures.len(),
            total: self.total,
            outcome,
        });
        None
    }
}

/// Feed jobs and sentinels to ready workers and drain their events until
/// every worker has exited. Returns the number of sentinels handed out.
fn feed_and_drain<O>(
    work_tx: &Sender<Dispatch>,
    event_rx: &Receiver<WorkerEvent<O>>,
    jobs: Vec<Job>,
    workers: usize,
    drain: &mut Drain<'_, O>,
) -> usize {
    let mut pending: VecDeque<Job> = jobs.into();
    let mut live = workers;
    let mut sentinels = 0;
    let mut feeding = true;

    while live > 0 {
        let mut sel = Select::new();
        let send_op = feeding.then(|| sel.send(work_tx));
        let recv_op = sel.recv(event_rx);
        let oper = sel.select();

        if Some(oper.index()) == send_op {
            let item = pending.pop_front().map_or(Dispatch::Done, Dispatch::Run);
            let sentinel = item.is_sentinel();
            match oper.send(work_tx, item) {
                Ok(()) if sentinel => {
                    sentinels += 1;
                    feeding = sentinels < workers;
                }
                Ok(()) => {}
                Err(SendError(Dispatch::Run(job))) => {
                    pending.push_front(job);
                    feeding = false;
                }
                Err(SendError(Dispatch::Done)) => feeding = false,
            }
        } else if oper.index() == recv_op {
            match oper.recv(event_rx) {
                Ok(event) => {
                    if let Some(slot) = drain.apply(event) {
                        live -= 1;
                        tracing::debug!(slot, live, "worker exited");
                    }
                }
                // Every worker has dropped its sender.
                Err(_) => break,
            }
        }
    }

    if !pending.is_empty() {
        tracing::info!(undispatched = pending.len(), "workers exited before all jobs were dispatched");
    }
    sentinels
}
