//! Error handling and exit codes.

use simfleet_core::constants::exit_codes;
use simfleet_core::SimError;

/// A batch finished without an output for every input, under `--strict`.
#[derive(Debug, thiserror::Error)]
#[error("{missing} of {total} inputs produced no output")]
pub struct IncompleteBatch {
    pub missing: usize,
    pub total: usize,
}

/// Map an application error to the process exit code.
pub fn handle_error(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<IncompleteBatch>().is_some() {
        return exit_codes::ERROR_INCOMPLETE;
    }
    match err.downcast_ref::<SimError>() {
        Some(e) if e.is_config() => exit_codes::ERROR_CONFIG,
        _ => exit_codes::ERROR_GENERIC,
    }
}
