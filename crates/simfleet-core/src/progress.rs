//! Batch progress types.

use crate::job::JobId;

/// How a finished job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// A result was collected.
    Completed,
    /// The job failed; the message is the rendered error.
    Failed(String),
}

/// Progress update emitted by the pool driver after each finished job.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Job that just finished.
    pub id: JobId,
    /// Slot that ran it.
    pub slot: usize,
    /// Jobs finished so far, failures included.
    pub done: usize,
    /// Jobs in the batch.
    pub total: usize,
    pub outcome: JobOutcome,
}

impl ProgressUpdate {
    /// Completion as a fraction in [0.0, 1.0].
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.done as f64 / self.total as f64).min(1.0)
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, JobOutcome::Failed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(done: usize, total: usize) -> ProgressUpdate {
        ProgressUpdate {
            id: JobId(0),
            slot: 0,
            done,
            total,
            outcome: JobOutcome::Completed,
        }
    }

    #[test]
    fn fraction() {
        assert!((update(1, 4).fraction() - 0.25).abs() < f64::EPSILON);
        assert!((update(4, 4).fraction() - 1.0).abs() < f64::EPSILON);
        assert!((update(0, 0).fraction() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn failure_flag() {
        let mut u = update(1, 2);
        assert!(!u.is_failure());
        u.outcome = JobOutcome::Failed("boom".into());
        assert!(u.is_failure());
    }
}
