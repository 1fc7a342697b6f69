//! Constants for the simulator file contract and process exit codes.

/// Substring marking the header line of a data block in a result file.
pub const START_MARKER: &str = "jtot";

/// Substring marking the summary footer that closes a data block.
pub const END_MARKER: &str = "deduced";

/// Line appended by the worker after every invocation so the last block
/// always has a closing footer.
pub const END_OF_DATA_LINE: &str = "I have deduced that this is the end";

/// Script file name written into each slot's `script/` directory.
pub const SCRIPT_FILE_NAME: &str = "simfleet.script";

/// Result file name the simulator is told to save into `results/`.
pub const RESULT_FILE_NAME: &str = "simfleet_result.txt";

/// Rows skipped after the start-marker line before data begins.
pub const DEFAULT_ROW_LEAD: usize = 2;

/// Rows excluded before the end-marker line (exclusive upper bound offset).
pub const DEFAULT_ROW_TRAIL: usize = 3;

/// Default ceiling on pool size; matches the number of provisioned slot
/// directories on a standard install.
pub const DEFAULT_MAX_SLOTS: usize = 3;

/// Default voltage sweep start (V).
pub const DEFAULT_SWEEP_START: f64 = 0.0;

/// Default voltage sweep increment (V).
pub const DEFAULT_SWEEP_STEP: f64 = 0.02;

/// Process exit codes for the `simfleet` binary.
pub mod exit_codes {
    /// Successful execution.
    pub const SUCCESS: i32 = 0;
    /// Generic error.
    pub const ERROR_GENERIC: i32 = 1;
    /// Batch finished with missing results (only reported in strict mode).
    pub const ERROR_INCOMPLETE: i32 = 3;
    /// Invalid configuration.
    pub const ERROR_CONFIG: i32 = 4;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_of_data_line_closes_a_block() {
        assert!(END_OF_DATA_LINE.contains(END_MARKER));
        assert!(!END_OF_DATA_LINE.contains(START_MARKER));
    }

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            exit_codes::SUCCESS,
            exit_codes::ERROR_GENERIC,
            exit_codes::ERROR_INCOMPLETE,
            exit_codes::ERROR_CONFIG,
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
