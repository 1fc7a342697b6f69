//! CLI result presenter.

use std::time::Duration;

use simfleet_orchestration::interfaces::ResultPresenter;
use simfleet_orchestration::pool::BatchSummary;

use crate::output::{format_duration, format_number};
use crate::ui::{print_error, print_header, print_success, print_warning};

/// CLI result presenter.
pub struct CLIResultPresenter {
    verbose: bool,
    quiet: bool,
}

impl CLIResultPresenter {
    #[must_use]
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// One-line outcome of a batch.
    #[must_use]
    pub fn summary_line(summary: &BatchSummary) -> String {
        format!(
            "{}/{} inputs completed in {}",
            format_number(summary.completed as u64),
            format_number(summary.total as u64),
            format_duration(summary.elapsed)
        )
    }

    /// Warning printed when a batch is incomplete, or `None` if it is not.
    #[must_use]
    pub fn missing_line(summary: &BatchSummary) -> Option<String> {
        let lost = summary.total.saturating_sub(summary.completed);
        (lost > 0).then(|| {
            format!(
                "{lost} of {} inputs produced no output ({} failed, {} never ran)",
                summary.total,
                summary.failures.len(),
                summary.missing.len()
            )
        })
    }

    /// Projected wall time for `jobs` jobs spread over `slots` slots.
    #[must_use]
    pub fn projected(per_job: Duration, jobs: usize, slots: usize) -> Duration {
        let waves = jobs.div_ceil(slots.max(1));
        per_job.saturating_mul(u32::try_from(waves).unwrap_or(u32::MAX))
    }
}

impl ResultPresenter for CLIResultPresenter {
    fn present_batch(&self, label: &str, summary: &BatchSummary) {
        if let Some(line) = Self::missing_line(summary) {
            print_warning(&line);
        }
        if self.quiet {
            return;
        }

        print_header(label);
        if self.verbose {
            for (id, error) in &summary.failures {
                println!("  ID{id}: {error}");
            }
            if !summary.missing.is_empty() {
                let ids: Vec<String> = summary.missing.iter().map(ToString::to_string).collect();
                println!("  never ran: {}", ids.join(", "));
            }
        }
        if summary.is_complete() {
            print_success(&Self::summary_line(summary));
        } else {
            println!("{}", Self::summary_line(summary));
        }
    }

    fn present_timing(&self, per_job: Duration, sampled: usize, jobs: usize, slots: usize) {
        if self.quiet {
            println!("{:.3}", per_job.as_secs_f64());
            return;
        }
        print_header("Timing sample");
        println!("Sampled jobs: {sampled}");
        println!("Mean per job: {}", format_duration(per_job));
        println!(
            "Projected for {} jobs on {slots} slots: {}",
            format_number(jobs as u64),
            format_duration(Self::projected(per_job, jobs, slots))
        );
    }

    fn present_error(&self, error: &str) {
        print_error(error);
    }
}
