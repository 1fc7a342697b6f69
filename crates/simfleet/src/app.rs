//! Application entry point and dispatch.

use std::sync::Arc;

use anyhow::{Context, Result};

use simfleet_cli::output::write_results;
use simfleet_cli::presenter::CLIResultPresenter;
use simfleet_cli::progress::CLIProgressReporter;
use simfleet_core::batch::{output_file_name, split_batches, BatchDocument};
use simfleet_core::job::Job;
use simfleet_core::parser::IvCurveParser;
use simfleet_core::script::IvSweepScript;
use simfleet_core::SimError;
use simfleet_orchestration::interfaces::{NullProgressReporter, ResultPresenter};
use simfleet_orchestration::pool::WorkerPool;
use simfleet_orchestration::timing::time_jobs;
use simfleet_orchestration::worker::SlotWorker;

use crate::config::AppConfig;
use crate::errors::IncompleteBatch;
use crate::version;

/// Run the application.
pub fn run(config: &AppConfig) -> Result<()> {
    if let Some(shell) = config.completion {
        let mut cmd = <AppConfig as clap::CommandFactory>::command();
        simfleet_cli::completion::generate_completion(&mut cmd, shell, &mut std::io::stdout());
        return Ok(());
    }
    tracing::info!(version = %version::full_version(), "starting");

    let inputs = config
        .inputs
        .as_deref()
        .ok_or_else(|| SimError::Config("--inputs is required".into()))?;
    let pool_config = config.pool_config()?;
    let pool = WorkerPool::new(pool_config.clone(), config.slots)?;

    let document = BatchDocument::load(inputs)
        .with_context(|| format!("loading batch document {}", inputs.display()))?;
    let jobs = select_jobs(&document, config.start, config.count)?;

    let runner = SlotWorker::new(&pool_config, Arc::new(IvSweepScript::new()), IvCurveParser::new());
    let presenter = CLIResultPresenter::new(config.verbose, config.quiet);

    match config.time_sample {
        Some(sample) => run_timing(config, &pool, &runner, &jobs, sample, &presenter),
        None => run_batches(config, &pool, &runner, jobs, &presenter),
    }
}

/// Jobs with ids in `[start, start + count)`, or every id from `start` on
/// when `count` is zero.
fn select_jobs(document: &BatchDocument, start: u64, count: u64) -> Result<Vec<Job>, SimError> {
    let jobs = if count == 0 {
        document
            .jobs()
            .into_iter()
            .filter(|job| job.id.0 >= start)
            .collect()
    } else {
        document.select_range(start, count)?
    };
    if jobs.is_empty() {
        return Err(SimError::Config(format!("no inputs selected from id {start}")));
    }
    Ok(jobs)
}

fn run_batches(
    config: &AppConfig,
    pool: &WorkerPool,
    runner: &SlotWorker<IvCurveParser>,
    jobs: Vec<Job>,
    presenter: &CLIResultPresenter,
) -> Result<()> {
    let batches = split_batches(jobs, config.batches)?;
    let mut lost = 0;
    let mut total = 0;

    for (index, batch) in batches.into_iter().enumerate() {
        let Some(name) = batch_file_name(&batch, config.node, index)? else {
            continue;
        };
        tracing::info!(batch = index, jobs = batch.len(), output = %name, "running batch");

        let reporter = CLIProgressReporter::new(batch.len(), config.quiet);
        let report = pool.run_batch(runner, batch, &reporter)?;
        let summary = report.summary();

        let path = config.output_dir.join(&name);
        write_results(&path, &report.into_outputs())
            .with_context(|| format!("writing {}", path.display()))?;
        presenter.present_batch(&name, &summary);

        total += summary.total;
        lost += summary.total - summary.completed;
    }

    if config.strict && lost > 0 {
        return Err(IncompleteBatch {
            missing: lost,
            total,
        }
        .into());
    }
    Ok(())
}

/// Output file name for a batch, covering its id range with the end
/// exclusive. `None` for an empty batch.
fn batch_file_name(batch: &[Job], node: u32, index: usize) -> Result<Option<String>, SimError> {
    let (Some(first), Some(last)) = (batch.first(), batch.last()) else {
        return Ok(None);
    };
    let end = last.id.0.checked_add(1).ok_or_else(|| {
        SimError::Config(format!(
            "input id {} is too large to name an output range",
            last.id
        ))
    })?;
    Ok(Some(output_file_name(first.id.0, end, node, index)))
}

fn run_timing(
    config: &AppConfig,
    pool: &WorkerPool,
    runner: &SlotWorker<IvCurveParser>,
    jobs: &[Job],
    sample: usize,
    presenter: &CLIResultPresenter,
) -> Result<()> {
    let mut rng = rand::thread_rng();
    let sampled = sample.min(jobs.len());
    let per_job = if config.quiet {
        time_jobs(pool, runner, jobs, sample, &mut rng, &NullProgressReporter)?
    } else {
        let reporter = CLIProgressReporter::new(sampled, false);
        time_jobs(pool, runner, jobs, sample, &mut rng, &reporter)?
    };
    presenter.present_timing(per_job, sampled, jobs.len(), pool.slots().len());
    Ok(())
}
