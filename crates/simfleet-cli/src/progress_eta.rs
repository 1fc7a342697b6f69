//! Batch ETA estimation.

use std::time::{Duration, Instant};

/// Estimates the time left in a batch from the fraction of jobs finished.
///
/// Simulator runs take roughly the same time each, so a linear projection
/// from elapsed time is good enough.
#[derive(Debug)]
pub struct ETACalculator {
    start_time: Instant,
}

impl ETACalculator {
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Calculator whose clock started at `start_time`.
    #[must_use]
    pub fn starting_at(start_time: Instant) -> Self {
        Self { start_time }
    }

    /// Record progress in `[0, 1]` and return the estimated time remaining.
    ///
    /// Returns `None` before the first job finishes and once the batch is
    /// done.
    pub fn update(&self, progress: f64) -> Option<Duration> {
        if progress <= 0.0 || progress >= 1.0 {
            return None;
        }
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let remaining = elapsed / progress - elapsed;
        (remaining > 0.0).then(|| Duration::from_secs_f64(remaining))
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for ETACalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_eta_at_the_ends() {
        let calc = ETACalculator::new();
        assert!(calc.update(0.0).is_none());
        assert!(calc.update(1.0).is_none());
    }

    #[test]
    fn halfway_projects_elapsed_again() {
        let start = Instant::now().checked_sub(Duration::from_secs(10)).unwrap();
        let calc = ETACalculator::starting_at(start);
        let eta = calc.update(0.5).unwrap();
        assert!(eta >= Duration::from_secs(9) && eta <= Duration::from_secs(12));
        let nearly = calc.update(0.9).unwrap();
        assert!(nearly < eta);
    }
}
