//! Terminal progress reporting for a running batch.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use simfleet_core::progress::{JobOutcome, ProgressUpdate};
use simfleet_orchestration::interfaces::ProgressReporter;

use crate::output::format_duration;
use crate::progress_eta::ETACalculator;

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// Progress bar plus one line per finished job.
pub struct CLIProgressReporter {
    bar: ProgressBar,
    eta: ETACalculator,
    quiet: bool,
}

impl CLIProgressReporter {
    /// Reporter for a batch of `total` jobs. In quiet mode nothing is drawn.
    #[must_use]
    pub fn new(total: usize, quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::hidden())
        } else {
            let bar = ProgressBar::new(total as u64);
            let style = ProgressStyle::default_bar()
                .template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-");
            bar.set_style(style);
            bar
        };
        Self {
            bar,
            eta: ETACalculator::new(),
            quiet,
        }
    }

    /// Line printed when a job finishes.
    #[must_use]
    pub fn finished_line(update: &ProgressUpdate) -> String {
        match &update.outcome {
            JobOutcome::Completed => format!(
                "Finished input ID{} on slot {} [{}/{} total]",
                update.id, update.slot, update.done, update.total
            ),
            JobOutcome::Failed(error) => format!(
                "Failed input ID{} on slot {} [{}/{} total]: {error}",
                update.id, update.slot, update.done, update.total
            ),
        }
    }
}

impl ProgressReporter for CLIProgressReporter {
    fn report(&self, update: &ProgressUpdate) {
        self.bar.set_position(update.done as u64);
        if let Some(eta) = self.eta.update(update.fraction()) {
            self.bar.set_message(format!("eta {}", format_duration(eta)));
        }
        if self.quiet {
            return;
        }
        // A hidden bar (stdout not a terminal) swallows println.
        if self.bar.is_hidden() {
            println!("{}", Self::finished_line(update));
        } else {
            self.bar.println(Self::finished_line(update));
        }
    }

    fn complete(&self) {
        let elapsed = self.eta.elapsed();
        self.bar
            .finish_with_message(format!("done in {}", format_duration(elapsed)));
    }
}
